use planivo_core::OrganizationId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resolved organizational scope for one provisioned role assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeContext {
    /// Owning organization, always present.
    pub organization_id: OrganizationId,
    /// Workspace inside the organization.
    pub workspace_id: Option<Uuid>,
    /// Facility inside the workspace.
    pub facility_id: Option<Uuid>,
    /// Department inside the facility.
    pub department_id: Option<Uuid>,
    /// Child department of `department_id`.
    pub specialty_id: Option<Uuid>,
}

impl ScopeContext {
    /// Creates an organization-wide scope.
    #[must_use]
    pub fn organization(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            workspace_id: None,
            facility_id: None,
            department_id: None,
            specialty_id: None,
        }
    }
}
