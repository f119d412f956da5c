use planivo_core::{AppError, AppResult, FieldViolation};
use planivo_domain::ImportRowInput;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Email,
    FullName,
    OrganizationName,
    WorkspaceName,
    FacilityName,
    DepartmentName,
    SpecialtyName,
    Role,
}

impl Column {
    const REQUIRED: [Self; 3] = [Self::Email, Self::FullName, Self::Role];

    fn from_header(header: &str) -> Option<Self> {
        match header.trim().to_ascii_lowercase().as_str() {
            "email" => Some(Self::Email),
            "full_name" => Some(Self::FullName),
            "organization_name" => Some(Self::OrganizationName),
            "workspace_name" => Some(Self::WorkspaceName),
            "facility_name" => Some(Self::FacilityName),
            "department_name" => Some(Self::DepartmentName),
            "specialty_name" => Some(Self::SpecialtyName),
            "role" => Some(Self::Role),
            _ => None,
        }
    }

    fn header(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::FullName => "full_name",
            Self::OrganizationName => "organization_name",
            Self::WorkspaceName => "workspace_name",
            Self::FacilityName => "facility_name",
            Self::DepartmentName => "department_name",
            Self::SpecialtyName => "specialty_name",
            Self::Role => "role",
        }
    }

    fn slot(self, row: &mut ImportRowInput) -> &mut Option<String> {
        match self {
            Self::Email => &mut row.email,
            Self::FullName => &mut row.full_name,
            Self::OrganizationName => &mut row.organization_name,
            Self::WorkspaceName => &mut row.workspace_name,
            Self::FacilityName => &mut row.facility_name,
            Self::DepartmentName => &mut row.department_name,
            Self::SpecialtyName => &mut row.specialty_name,
            Self::Role => &mut row.role,
        }
    }
}

/// Parses a CSV import body into unvalidated rows, in file order.
///
/// Headers match case-insensitively and unknown columns are ignored. Field
/// level validation is left to the batch validator so CSV and JSON callers
/// see the same violations.
pub(super) fn parse_import_csv(data: &[u8]) -> AppResult<Vec<ImportRowInput>> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(invalid("body", "CSV body is empty".to_owned()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let columns: Vec<Option<Column>> = reader
        .headers()
        .map_err(|error| invalid("header", format!("unreadable CSV header: {error}")))?
        .iter()
        .map(Column::from_header)
        .collect();

    let missing: Vec<FieldViolation> = Column::REQUIRED
        .iter()
        .filter(|required| !columns.contains(&Some(**required)))
        .map(|required| {
            FieldViolation::new(
                "header",
                format!("missing required column '{}'", required.header()),
            )
        })
        .collect();
    if !missing.is_empty() {
        return Err(AppError::InvalidInput(missing));
    }

    let mut rows = Vec::new();
    let mut violations = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(error) => {
                violations.push(FieldViolation::new(
                    format!("users[{index}]"),
                    format!("malformed CSV record: {error}"),
                ));
                continue;
            }
        };

        let mut row = ImportRowInput::default();
        for (column, value) in columns.iter().zip(record.iter()) {
            if let Some(column) = column {
                *column.slot(&mut row) = Some(value.to_owned());
            }
        }
        rows.push(row);
    }

    if !violations.is_empty() {
        return Err(AppError::InvalidInput(violations));
    }

    Ok(rows)
}

fn invalid(field: &str, message: String) -> AppError {
    AppError::InvalidInput(vec![FieldViolation::new(field, message)])
}

#[cfg(test)]
mod tests {
    use planivo_core::AppError;

    use super::parse_import_csv;

    #[test]
    fn rows_follow_header_order_with_bom_and_mixed_case() {
        let body = "\u{feff}Email,FULL_NAME,Workspace_Name,facility_name,department_name,role\n\
                    a@x.com,Ada Nurse,North,F1,D1,staff\n\
                    b@x.com,Bo Head,North,F1,D1,department_head\n";

        let rows = parse_import_csv(body.as_bytes());
        assert!(rows.is_ok());
        let rows = rows.unwrap_or_default();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].email.as_deref(), Some("a@x.com"));
        assert_eq!(rows[0].full_name.as_deref(), Some("Ada Nurse"));
        assert_eq!(rows[0].workspace_name.as_deref(), Some("North"));
        assert_eq!(rows[1].role.as_deref(), Some("department_head"));
        assert_eq!(rows[1].organization_name, None);
    }

    #[test]
    fn unknown_columns_are_ignored_and_short_records_leave_fields_absent() {
        let body = "email,full_name,role,employee_number,specialty_name\n\
                    a@x.com,Ada,staff,E-1\n";

        let rows = parse_import_csv(body.as_bytes()).unwrap_or_default();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].role.as_deref(), Some("staff"));
        assert_eq!(rows[0].specialty_name, None);
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let body = "email,full_name,role,facility_name\n\
                    a@x.com,\"Nurse, Ada\",staff,\"F1, East\"\n";

        let rows = parse_import_csv(body.as_bytes()).unwrap_or_default();

        assert_eq!(rows[0].full_name.as_deref(), Some("Nurse, Ada"));
        assert_eq!(rows[0].facility_name.as_deref(), Some("F1, East"));
    }

    #[test]
    fn missing_required_columns_are_listed() {
        let result = parse_import_csv(b"email,workspace_name\na@x.com,North\n");

        match result {
            Err(AppError::InvalidInput(violations)) => {
                let messages: Vec<String> =
                    violations.into_iter().map(|violation| violation.message).collect();
                assert_eq!(
                    messages,
                    vec![
                        "missing required column 'full_name'".to_owned(),
                        "missing required column 'role'".to_owned(),
                    ]
                );
            }
            other => panic!("expected invalid input, got {other:?}"),
        }
    }

    #[test]
    fn empty_body_is_rejected() {
        assert!(matches!(
            parse_import_csv(b"  \n"),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_import_csv(b"\xEF\xBB\xBF"),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn header_only_body_yields_no_rows() {
        let rows = parse_import_csv(b"email,full_name,role\n");
        assert_eq!(rows.ok().map(|rows| rows.len()), Some(0));
    }
}
