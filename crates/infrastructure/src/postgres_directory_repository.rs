//! PostgreSQL-backed organization directory lookups.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use planivo_application::{DirectoryRepository, FacilityMatch};
use planivo_core::{AppError, AppResult, OrganizationId};


/// PostgreSQL implementation of the directory repository port.
#[derive(Clone)]
pub struct PostgresDirectoryRepository {
    pool: PgPool,
}

impl PostgresDirectoryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FacilityRow {
    id: Uuid,
    workspace_id: Uuid,
}

#[async_trait]
impl DirectoryRepository for PostgresDirectoryRepository {
    async fn find_organization_by_name(&self, name: &str) -> AppResult<Option<OrganizationId>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM organizations
            WHERE LOWER(name) = LOWER($1) AND is_active
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find organization: {error}")))?;

        Ok(id.map(OrganizationId::from_uuid))
    }

    async fn organization_exists(&self, organization_id: OrganizationId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM organizations WHERE id = $1 AND is_active
            )
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to check organization: {error}")))
    }

    async fn find_workspace_by_name(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> AppResult<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM workspaces
            WHERE organization_id = $1 AND LOWER(name) = LOWER($2)
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find workspace: {error}")))
    }

    async fn find_facilities_by_name(
        &self,
        organization_id: OrganizationId,
        workspace_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Vec<FacilityMatch>> {
        let rows = sqlx::query_as::<_, FacilityRow>(
            r#"
            SELECT facilities.id, facilities.workspace_id
            FROM facilities
            INNER JOIN workspaces ON workspaces.id = facilities.workspace_id
            WHERE workspaces.organization_id = $1
              AND ($2::uuid IS NULL OR facilities.workspace_id = $2)
              AND LOWER(facilities.name) = LOWER($3)
            ORDER BY facilities.created_at
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(workspace_id)
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find facilities: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| FacilityMatch {
                facility_id: row.id,
                workspace_id: row.workspace_id,
            })
            .collect())
    }

    async fn find_department_by_name(
        &self,
        facility_id: Uuid,
        name: &str,
    ) -> AppResult<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM departments
            WHERE facility_id = $1
              AND parent_department_id IS NULL
              AND LOWER(name) = LOWER($2)
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(facility_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find department: {error}")))
    }

    async fn find_specialty_by_name(
        &self,
        department_id: Uuid,
        name: &str,
    ) -> AppResult<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM departments
            WHERE parent_department_id = $1 AND LOWER(name) = LOWER($2)
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(department_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find specialty: {error}")))
    }
}
