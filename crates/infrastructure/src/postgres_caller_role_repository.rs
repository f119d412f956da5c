//! PostgreSQL-backed role grant lookup for callers.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use planivo_application::{CallerRoleRepository, RoleGrant};
use planivo_core::{AppError, AppResult, OrganizationId};
use planivo_domain::Role;

/// PostgreSQL implementation of the caller role repository port.
#[derive(Clone)]
pub struct PostgresCallerRoleRepository {
    pool: PgPool,
}

impl PostgresCallerRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RoleGrantRow {
    role: String,
    organization_id: Option<Uuid>,
}

#[async_trait]
impl CallerRoleRepository for PostgresCallerRoleRepository {
    async fn list_role_grants(&self, user_id: Uuid) -> AppResult<Vec<RoleGrant>> {
        let rows = sqlx::query_as::<_, RoleGrantRow>(
            r#"
            SELECT DISTINCT role, organization_id
            FROM role_assignments
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role grants: {error}")))?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match row.role.parse::<Role>() {
                Ok(role) => Some(RoleGrant {
                    role,
                    organization_id: row.organization_id.map(OrganizationId::from_uuid),
                }),
                Err(error) => {
                    warn!(role = %row.role, error = %error, "ignoring unknown role grant");
                    None
                }
            })
            .collect())
    }
}
