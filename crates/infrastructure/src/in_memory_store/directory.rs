use async_trait::async_trait;
use planivo_application::{DirectoryRepository, FacilityMatch};
use planivo_core::{AppResult, OrganizationId};
use uuid::Uuid;

use super::InMemoryPlanivoStore;

#[async_trait]
impl DirectoryRepository for InMemoryPlanivoStore {
    async fn find_organization_by_name(&self, name: &str) -> AppResult<Option<OrganizationId>> {
        Ok(self
            .organizations
            .read()
            .await
            .iter()
            .find(|(_, (stored, active))| *active && stored.eq_ignore_ascii_case(name))
            .map(|(organization_id, _)| *organization_id))
    }

    async fn organization_exists(&self, organization_id: OrganizationId) -> AppResult<bool> {
        Ok(self
            .organizations
            .read()
            .await
            .get(&organization_id)
            .is_some_and(|(_, active)| *active))
    }

    async fn find_workspace_by_name(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> AppResult<Option<Uuid>> {
        Ok(self
            .workspaces
            .read()
            .await
            .iter()
            .find(|(_, workspace)| {
                workspace.organization_id == organization_id
                    && workspace.name.eq_ignore_ascii_case(name)
            })
            .map(|(id, _)| *id))
    }

    async fn find_facilities_by_name(
        &self,
        organization_id: OrganizationId,
        workspace_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Vec<FacilityMatch>> {
        let workspaces = self.workspaces.read().await;
        let mut matches: Vec<FacilityMatch> = self
            .facilities
            .read()
            .await
            .iter()
            .filter(|(_, facility)| {
                workspaces
                    .get(&facility.workspace_id)
                    .is_some_and(|workspace| workspace.organization_id == organization_id)
                    && workspace_id.is_none_or(|id| id == facility.workspace_id)
                    && facility.name.eq_ignore_ascii_case(name)
            })
            .map(|(id, facility)| FacilityMatch {
                facility_id: *id,
                workspace_id: facility.workspace_id,
            })
            .collect();
        matches.sort_by_key(|facility| facility.facility_id);

        Ok(matches)
    }

    async fn find_department_by_name(
        &self,
        facility_id: Uuid,
        name: &str,
    ) -> AppResult<Option<Uuid>> {
        Ok(self
            .departments
            .read()
            .await
            .iter()
            .find(|(_, department)| {
                department.facility_id == facility_id
                    && department.parent_id.is_none()
                    && department.name.eq_ignore_ascii_case(name)
            })
            .map(|(id, _)| *id))
    }

    async fn find_specialty_by_name(
        &self,
        department_id: Uuid,
        name: &str,
    ) -> AppResult<Option<Uuid>> {
        Ok(self
            .departments
            .read()
            .await
            .iter()
            .find(|(_, department)| {
                department.parent_id == Some(department_id)
                    && department.name.eq_ignore_ascii_case(name)
            })
            .map(|(id, _)| *id))
    }
}
