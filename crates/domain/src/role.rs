use std::str::FromStr;

use planivo_core::AppError;
use serde::{Deserialize, Serialize};

/// Enumerated permission level scoping a user to part of an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform-wide administrator. Never assignable through bulk import.
    SuperAdmin,
    /// Administers one organization.
    OrganizationAdmin,
    /// Organization-wide administrator for day-to-day operations.
    GeneralAdmin,
    /// Supervises one workspace.
    WorkspaceSupervisor,
    /// Supervises a workplace inside a workspace.
    WorkplaceSupervisor,
    /// Supervises one facility.
    FacilitySupervisor,
    /// Leads one department.
    DepartmentHead,
    /// Regular department staff member.
    Staff,
    /// Intern attached to a department.
    Intern,
}

/// Roles allowed to invoke privileged administration endpoints.
pub const ADMINISTRATIVE_ROLES: &[Role] =
    &[Role::SuperAdmin, Role::OrganizationAdmin, Role::GeneralAdmin];

impl Role {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::OrganizationAdmin => "organization_admin",
            Self::GeneralAdmin => "general_admin",
            Self::WorkspaceSupervisor => "workspace_supervisor",
            Self::WorkplaceSupervisor => "workplace_supervisor",
            Self::FacilitySupervisor => "facility_supervisor",
            Self::DepartmentHead => "department_head",
            Self::Staff => "staff",
            Self::Intern => "intern",
        }
    }

    /// Returns the roles that may be assigned through bulk import.
    #[must_use]
    pub fn importable() -> &'static [Self] {
        const IMPORTABLE: &[Role] = &[
            Role::Staff,
            Role::DepartmentHead,
            Role::FacilitySupervisor,
            Role::WorkplaceSupervisor,
            Role::GeneralAdmin,
            Role::OrganizationAdmin,
            Role::WorkspaceSupervisor,
            Role::Intern,
        ];

        IMPORTABLE
    }

    /// Parses a role that may be assigned through bulk import.
    pub fn parse_importable(value: &str) -> Result<Self, AppError> {
        let role = Self::from_str(value.trim())?;
        if !Self::importable().contains(&role) {
            return Err(AppError::Validation(format!(
                "role '{}' cannot be assigned through bulk import",
                role.as_str()
            )));
        }

        Ok(role)
    }

    /// Whether the role is organization-scoped rather than workspace-scoped.
    #[must_use]
    pub fn requires_workspace(&self) -> bool {
        !matches!(
            self,
            Self::SuperAdmin | Self::OrganizationAdmin | Self::GeneralAdmin
        )
    }

    /// Whether the role is bound to a facility.
    #[must_use]
    pub fn requires_facility(&self) -> bool {
        matches!(
            self,
            Self::FacilitySupervisor | Self::DepartmentHead | Self::Staff | Self::Intern
        )
    }

    /// Whether the role is bound to a department.
    #[must_use]
    pub fn requires_department(&self) -> bool {
        matches!(self, Self::DepartmentHead | Self::Staff | Self::Intern)
    }

    /// Whether the role grants access to privileged administration endpoints.
    #[must_use]
    pub fn is_administrative(&self) -> bool {
        ADMINISTRATIVE_ROLES.contains(self)
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "super_admin" => Ok(Self::SuperAdmin),
            "organization_admin" => Ok(Self::OrganizationAdmin),
            "general_admin" => Ok(Self::GeneralAdmin),
            "workspace_supervisor" => Ok(Self::WorkspaceSupervisor),
            "workplace_supervisor" => Ok(Self::WorkplaceSupervisor),
            "facility_supervisor" => Ok(Self::FacilitySupervisor),
            "department_head" => Ok(Self::DepartmentHead),
            "staff" => Ok(Self::Staff),
            "intern" => Ok(Self::Intern),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}
