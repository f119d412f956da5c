//! PostgreSQL-backed profile, role assignment and leave balance writes.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use planivo_application::{
    ExistingProfile, LeaveBalanceInit, ProfileUpsert, ProvisioningRepository,
    RoleAssignmentUpsert,
};
use planivo_core::{AppError, AppResult, OrganizationId};
use planivo_domain::UserId;


/// PostgreSQL implementation of the provisioning repository port.
#[derive(Clone)]
pub struct PostgresProvisioningRepository {
    pool: PgPool,
}

impl PostgresProvisioningRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProvisioningRepository for PostgresProvisioningRepository {
    async fn find_profile_by_email(&self, email: &str) -> AppResult<Option<ExistingProfile>> {
        let row = sqlx::query_as::<_, (Uuid, Option<Uuid>)>(
            r#"
            SELECT id, organization_id
            FROM profiles
            WHERE LOWER(email) = LOWER($1)
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find profile: {error}")))?;

        Ok(row.map(|(id, organization_id)| ExistingProfile {
            user_id: UserId::from_uuid(id),
            organization_id: organization_id.map(OrganizationId::from_uuid),
        }))
    }

    async fn upsert_profile(&self, profile: &ProfileUpsert) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, email, full_name, organization_id, created_by)
            VALUES ($1, LOWER($2), $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email,
                full_name = EXCLUDED.full_name,
                organization_id = EXCLUDED.organization_id,
                updated_at = now()
            "#,
        )
        .bind(profile.user_id.as_uuid())
        .bind(profile.email.as_str())
        .bind(profile.full_name.as_str())
        .bind(profile.organization_id.as_uuid())
        .bind(profile.created_by)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to upsert profile: {error}")))?;

        Ok(())
    }

    async fn upsert_role_assignment(&self, assignment: &RoleAssignmentUpsert) -> AppResult<()> {
        let scope = assignment.scope;
        let result = sqlx::query(
            r#"
            INSERT INTO role_assignments (
                user_id,
                role,
                organization_id,
                workspace_id,
                facility_id,
                department_id,
                specialty_id,
                assigned_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(assignment.user_id.as_uuid())
        .bind(assignment.role.as_str())
        .bind(scope.organization_id.as_uuid())
        .bind(scope.workspace_id)
        .bind(scope.facility_id)
        .bind(scope.department_id)
        .bind(scope.specialty_id)
        .bind(assignment.assigned_by)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to upsert role assignment: {error}"))
        })?;

        if result.rows_affected() == 0 {
            debug!(
                user_id = %assignment.user_id,
                role = assignment.role.as_str(),
                specialty_id = ?scope.specialty_id,
                "role assignment already present, specialty left unchanged"
            );
        }

        Ok(())
    }

    async fn list_active_leave_type_ids(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM leave_types
            WHERE organization_id = $1 AND is_active
            ORDER BY created_at
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list leave types: {error}")))
    }

    async fn ensure_leave_balance(
        &self,
        user_id: UserId,
        leave_type_id: Uuid,
        year: i32,
    ) -> AppResult<LeaveBalanceInit> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO leave_balances (staff_id, leave_type_id, year, accrued, used, balance)
            VALUES ($1, $2, $3, 0, 0, 0)
            ON CONFLICT (staff_id, leave_type_id, year) DO NOTHING
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(leave_type_id)
        .bind(year)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to ensure leave balance: {error}")))?
        .rows_affected();

        Ok(if inserted > 0 {
            LeaveBalanceInit::Created
        } else {
            LeaveBalanceInit::AlreadyPresent
        })
    }
}
