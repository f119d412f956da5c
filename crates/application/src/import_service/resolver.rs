use std::collections::HashMap;
use std::sync::Arc;

use planivo_core::{AppError, AppResult, OrganizationId};
use uuid::Uuid;

use crate::import_ports::{DirectoryRepository, FacilityMatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FacilityScopeKey {
    Workspace(Uuid),
    Any(OrganizationId),
}

/// Per-batch memo of resolved names.
///
/// Keys use lower-cased names. A cache lives for exactly one import call and
/// is never shared between calls.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    organizations: HashMap<String, OrganizationId>,
    workspaces: HashMap<(OrganizationId, String), Uuid>,
    facilities: HashMap<(FacilityScopeKey, String), FacilityMatch>,
    departments: HashMap<(Uuid, String), Uuid>,
    specialties: HashMap<(Uuid, String), Option<Uuid>>,
}

impl ResolutionCache {
    /// Number of memoized lookups across all levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.organizations.len()
            + self.workspaces.len()
            + self.facilities.len()
            + self.departments.len()
            + self.specialties.len()
    }

    /// Whether nothing has been resolved yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves organizational names to identifiers through the directory port.
#[derive(Clone)]
pub struct NameResolver {
    directory: Arc<dyn DirectoryRepository>,
}

impl NameResolver {
    /// Creates a resolver over the directory repository.
    #[must_use]
    pub fn new(directory: Arc<dyn DirectoryRepository>) -> Self {
        Self { directory }
    }

    /// Resolves an active organization by name.
    pub async fn resolve_organization(
        &self,
        cache: &mut ResolutionCache,
        name: &str,
    ) -> AppResult<OrganizationId> {
        let key = name.to_lowercase();
        if let Some(organization_id) = cache.organizations.get(&key) {
            return Ok(*organization_id);
        }

        let organization_id = self
            .directory
            .find_organization_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Organization \"{name}\" not found")))?;

        cache.organizations.insert(key, organization_id);
        Ok(organization_id)
    }

    /// Resolves a workspace of the organization by name.
    pub async fn resolve_workspace(
        &self,
        cache: &mut ResolutionCache,
        name: &str,
        organization_id: OrganizationId,
    ) -> AppResult<Uuid> {
        let key = (organization_id, name.to_lowercase());
        if let Some(workspace_id) = cache.workspaces.get(&key) {
            return Ok(*workspace_id);
        }

        let workspace_id = self
            .directory
            .find_workspace_by_name(organization_id, name)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Workspace \"{name}\" not found in organization {organization_id}"
                ))
            })?;

        cache.workspaces.insert(key, workspace_id);
        Ok(workspace_id)
    }

    /// Resolves a facility by name.
    ///
    /// Narrows to `workspace_id` when known, otherwise searches every
    /// workspace of the organization. A name matching facilities in several
    /// workspaces is a conflict.
    pub async fn resolve_facility(
        &self,
        cache: &mut ResolutionCache,
        name: &str,
        workspace_id: Option<Uuid>,
        organization_id: OrganizationId,
    ) -> AppResult<FacilityMatch> {
        let scope = workspace_id.map_or(
            FacilityScopeKey::Any(organization_id),
            FacilityScopeKey::Workspace,
        );
        let key = (scope, name.to_lowercase());
        if let Some(facility) = cache.facilities.get(&key) {
            return Ok(*facility);
        }

        let location = match workspace_id {
            Some(workspace_id) => format!("workspace {workspace_id}"),
            None => format!("organization {organization_id}"),
        };

        let mut matches = self
            .directory
            .find_facilities_by_name(organization_id, workspace_id, name)
            .await?;

        let facility = match matches.len() {
            0 => {
                return Err(AppError::NotFound(format!(
                    "Facility \"{name}\" not found in {location}"
                )));
            }
            1 => matches.remove(0),
            count => {
                return Err(AppError::Conflict(format!(
                    "Facility \"{name}\" matches {count} facilities in {location}; \
                     add workspace_name to disambiguate"
                )));
            }
        };

        cache.facilities.insert(key, facility);
        Ok(facility)
    }

    /// Resolves a top-level department of the facility by name.
    pub async fn resolve_department(
        &self,
        cache: &mut ResolutionCache,
        name: &str,
        facility_id: Uuid,
    ) -> AppResult<Uuid> {
        let key = (facility_id, name.to_lowercase());
        if let Some(department_id) = cache.departments.get(&key) {
            return Ok(*department_id);
        }

        let department_id = self
            .directory
            .find_department_by_name(facility_id, name)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Department \"{name}\" not found in facility {facility_id}"
                ))
            })?;

        cache.departments.insert(key, department_id);
        Ok(department_id)
    }

    /// Resolves a specialty (child department). Absence is not an error.
    pub async fn resolve_specialty(
        &self,
        cache: &mut ResolutionCache,
        name: &str,
        department_id: Uuid,
    ) -> AppResult<Option<Uuid>> {
        let key = (department_id, name.to_lowercase());
        if let Some(specialty_id) = cache.specialties.get(&key) {
            return Ok(*specialty_id);
        }

        let specialty_id = self
            .directory
            .find_specialty_by_name(department_id, name)
            .await?;

        cache.specialties.insert(key, specialty_id);
        Ok(specialty_id)
    }

    /// Checks that a caller-supplied default organization exists and is active.
    pub async fn verify_organization(&self, organization_id: OrganizationId) -> AppResult<()> {
        if self.directory.organization_exists(organization_id).await? {
            return Ok(());
        }

        Err(AppError::NotFound(format!(
            "Organization {organization_id} not found"
        )))
    }
}
