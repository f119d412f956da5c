use async_trait::async_trait;
use planivo_core::{AppResult, OrganizationId};
use uuid::Uuid;

/// Facility found by name together with the workspace that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FacilityMatch {
    /// Facility identifier.
    pub facility_id: Uuid,
    /// Owning workspace identifier.
    pub workspace_id: Uuid,
}

/// Read-only port resolving organizational names to identifiers.
///
/// Every name comparison is a case-insensitive exact match.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// Finds an active organization by name.
    async fn find_organization_by_name(&self, name: &str) -> AppResult<Option<OrganizationId>>;

    /// Returns whether an active organization with this identifier exists.
    async fn organization_exists(&self, organization_id: OrganizationId) -> AppResult<bool>;

    /// Finds a workspace of the organization by name.
    async fn find_workspace_by_name(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> AppResult<Option<Uuid>>;

    /// Finds facilities by name, inside one workspace when given, otherwise
    /// across every workspace of the organization.
    async fn find_facilities_by_name(
        &self,
        organization_id: OrganizationId,
        workspace_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Vec<FacilityMatch>>;

    /// Finds a top-level department of the facility by name.
    async fn find_department_by_name(&self, facility_id: Uuid, name: &str)
    -> AppResult<Option<Uuid>>;

    /// Finds a child department (specialty) of the department by name.
    async fn find_specialty_by_name(
        &self,
        department_id: Uuid,
        name: &str,
    ) -> AppResult<Option<Uuid>>;
}
