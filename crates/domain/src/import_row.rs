//! Bulk import row shape and batch-level validation.

use planivo_core::{AppError, AppResult, FieldViolation, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{EmailAddress, Role};

/// Maximum number of rows accepted by one import call.
pub const MAX_IMPORT_ROWS: usize = 100;

/// Row number reported for the first data row (row 1 is the header).
pub const FIRST_DATA_ROW_NUMBER: usize = 2;

const FULL_NAME_MAX_LENGTH: usize = 200;
const SCOPE_NAME_MAX_LENGTH: usize = 200;

/// Unvalidated import row as submitted by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRowInput {
    /// Account email.
    pub email: Option<String>,
    /// Display name stored on the profile.
    pub full_name: Option<String>,
    /// Organization override for this row.
    pub organization_name: Option<String>,
    /// Workspace inside the organization.
    pub workspace_name: Option<String>,
    /// Facility inside the workspace.
    pub facility_name: Option<String>,
    /// Department inside the facility.
    pub department_name: Option<String>,
    /// Child department of the department.
    pub specialty_name: Option<String>,
    /// Role storage value.
    pub role: Option<String>,
}

/// Validated import row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    row_number: usize,
    email: EmailAddress,
    full_name: NonEmptyString,
    organization_name: Option<NonEmptyString>,
    workspace_name: Option<NonEmptyString>,
    facility_name: Option<NonEmptyString>,
    department_name: Option<NonEmptyString>,
    specialty_name: Option<NonEmptyString>,
    role: Role,
}

impl ImportRow {
    /// Validates one row, collecting every violated constraint.
    ///
    /// `field_prefix` is prepended to reported field paths, e.g. `users[4]`.
    pub fn parse(
        row_number: usize,
        field_prefix: &str,
        input: &ImportRowInput,
    ) -> Result<Self, Vec<FieldViolation>> {
        let mut violations = Vec::new();
        let field = |name: &str| format!("{field_prefix}.{name}");

        let email = match EmailAddress::new(input.email.clone().unwrap_or_default()) {
            Ok(email) => Some(email),
            Err(error) => {
                violations.push(FieldViolation::new(field("email"), describe(error)));
                None
            }
        };

        let full_name = match NonEmptyString::new(input.full_name.clone().unwrap_or_default()) {
            Ok(name) if name.as_str().chars().count() > FULL_NAME_MAX_LENGTH => {
                violations.push(FieldViolation::new(
                    field("full_name"),
                    format!("must not exceed {FULL_NAME_MAX_LENGTH} characters"),
                ));
                None
            }
            Ok(name) => Some(name),
            Err(_) => {
                violations.push(FieldViolation::new(field("full_name"), "must not be empty"));
                None
            }
        };

        let role = match input.role.as_deref() {
            Some(value) if !value.trim().is_empty() => match Role::parse_importable(value) {
                Ok(role) => Some(role),
                Err(error) => {
                    violations.push(FieldViolation::new(field("role"), describe(error)));
                    None
                }
            },
            _ => {
                violations.push(FieldViolation::new(field("role"), "must not be empty"));
                None
            }
        };

        let mut scope_name = |name: &str, value: &Option<String>| {
            let parsed = NonEmptyString::from_optional(value.as_deref());
            if let Some(parsed) = &parsed
                && parsed.as_str().chars().count() > SCOPE_NAME_MAX_LENGTH
            {
                violations.push(FieldViolation::new(
                    field(name),
                    format!("must not exceed {SCOPE_NAME_MAX_LENGTH} characters"),
                ));
            }
            parsed
        };

        let organization_name = scope_name("organization_name", &input.organization_name);
        let workspace_name = scope_name("workspace_name", &input.workspace_name);
        let facility_name = scope_name("facility_name", &input.facility_name);
        let department_name = scope_name("department_name", &input.department_name);
        let specialty_name = scope_name("specialty_name", &input.specialty_name);

        match (email, full_name, role) {
            (Some(email), Some(full_name), Some(role)) if violations.is_empty() => Ok(Self {
                row_number,
                email,
                full_name,
                organization_name,
                workspace_name,
                facility_name,
                department_name,
                specialty_name,
                role,
            }),
            _ => Err(violations),
        }
    }

    /// Original row number, counting the header as row 1.
    #[must_use]
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    /// Normalized account email.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Profile display name.
    #[must_use]
    pub fn full_name(&self) -> &str {
        self.full_name.as_str()
    }

    /// Organization override, if any.
    #[must_use]
    pub fn organization_name(&self) -> Option<&str> {
        self.organization_name.as_ref().map(NonEmptyString::as_str)
    }

    /// Workspace name, if any.
    #[must_use]
    pub fn workspace_name(&self) -> Option<&str> {
        self.workspace_name.as_ref().map(NonEmptyString::as_str)
    }

    /// Facility name, if any.
    #[must_use]
    pub fn facility_name(&self) -> Option<&str> {
        self.facility_name.as_ref().map(NonEmptyString::as_str)
    }

    /// Department name, if any.
    #[must_use]
    pub fn department_name(&self) -> Option<&str> {
        self.department_name.as_ref().map(NonEmptyString::as_str)
    }

    /// Specialty name, if any.
    #[must_use]
    pub fn specialty_name(&self) -> Option<&str> {
        self.specialty_name.as_ref().map(NonEmptyString::as_str)
    }

    /// Role to assign.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }
}

/// Validates a whole import batch before any row is processed.
///
/// Rejects empty and oversized batches and reports every field violation
/// across all rows in one error.
pub fn validate_import_batch(inputs: &[ImportRowInput]) -> AppResult<Vec<ImportRow>> {
    let mut violations = Vec::new();

    if inputs.is_empty() {
        violations.push(FieldViolation::new("users", "must contain at least 1 row"));
    }

    if inputs.len() > MAX_IMPORT_ROWS {
        violations.push(FieldViolation::new(
            "users",
            format!(
                "must contain at most {MAX_IMPORT_ROWS} rows, got {}",
                inputs.len()
            ),
        ));
    }

    let mut rows = Vec::with_capacity(inputs.len().min(MAX_IMPORT_ROWS));
    for (index, input) in inputs.iter().enumerate() {
        let prefix = format!("users[{index}]");
        match ImportRow::parse(index + FIRST_DATA_ROW_NUMBER, prefix.as_str(), input) {
            Ok(row) => rows.push(row),
            Err(row_violations) => violations.extend(row_violations),
        }
    }

    if !violations.is_empty() {
        return Err(AppError::InvalidInput(violations));
    }

    Ok(rows)
}

fn describe(error: AppError) -> String {
    match error {
        AppError::Validation(message) => message,
        other => other.to_string(),
    }
}
