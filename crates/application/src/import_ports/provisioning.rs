use async_trait::async_trait;
use planivo_core::{AppResult, OrganizationId};
use planivo_domain::{Role, ScopeContext, UserId};
use uuid::Uuid;

/// Profile write keyed by user identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpsert {
    /// Account identifier, also the profile key.
    pub user_id: UserId,
    /// Normalized email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Home organization of the profile.
    pub organization_id: OrganizationId,
    /// Administrator who provisioned the profile.
    pub created_by: Uuid,
}

/// Profile already registered for an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistingProfile {
    /// Account identifier owning the profile.
    pub user_id: UserId,
    /// Home organization, absent once that organization was deleted.
    pub organization_id: Option<OrganizationId>,
}

/// Role assignment write keyed by (user, role, workspace, facility, department, organization).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoleAssignmentUpsert {
    /// Assigned user.
    pub user_id: UserId,
    /// Assigned role.
    pub role: Role,
    /// Resolved scope of the assignment.
    pub scope: ScopeContext,
    /// Administrator who made the assignment.
    pub assigned_by: Uuid,
}

/// Result of ensuring a leave balance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveBalanceInit {
    /// A zero balance was inserted.
    Created,
    /// A balance already existed and was left untouched.
    AlreadyPresent,
}

/// Write port for profile, role assignment and leave balance records.
///
/// Every write is an idempotent upsert on its natural key.
#[async_trait]
pub trait ProvisioningRepository: Send + Sync {
    /// Finds the profile owning a normalized email.
    async fn find_profile_by_email(&self, email: &str) -> AppResult<Option<ExistingProfile>>;

    /// Inserts or refreshes a profile.
    async fn upsert_profile(&self, profile: &ProfileUpsert) -> AppResult<()>;

    /// Inserts a role assignment unless the composite key already exists.
    async fn upsert_role_assignment(&self, assignment: &RoleAssignmentUpsert) -> AppResult<()>;

    /// Lists active leave types configured for the organization.
    async fn list_active_leave_type_ids(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<Uuid>>;

    /// Ensures a zero balance exists for (user, leave type, year).
    async fn ensure_leave_balance(
        &self,
        user_id: UserId,
        leave_type_id: Uuid,
        year: i32,
    ) -> AppResult<LeaveBalanceInit>;
}
