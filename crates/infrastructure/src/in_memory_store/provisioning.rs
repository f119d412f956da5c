use async_trait::async_trait;
use planivo_application::{
    AccountCreation, AccountProvider, ExistingProfile, LeaveBalanceInit, NewAccount,
    ProfileUpsert, ProvisioningRepository, RoleAssignmentUpsert,
};
use planivo_core::{AppResult, OrganizationId};
use planivo_domain::{UserId, validate_password};
use tracing::debug;
use uuid::Uuid;

use super::InMemoryPlanivoStore;

#[async_trait]
impl ProvisioningRepository for InMemoryPlanivoStore {
    async fn find_profile_by_email(&self, email: &str) -> AppResult<Option<ExistingProfile>> {
        Ok(self
            .profiles
            .read()
            .await
            .values()
            .find(|profile| profile.email.eq_ignore_ascii_case(email))
            .map(|profile| ExistingProfile {
                user_id: profile.user_id,
                organization_id: Some(profile.organization_id),
            }))
    }

    async fn upsert_profile(&self, profile: &ProfileUpsert) -> AppResult<()> {
        self.profiles
            .write()
            .await
            .insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn upsert_role_assignment(&self, assignment: &RoleAssignmentUpsert) -> AppResult<()> {
        let mut assignments = self.role_assignments.write().await;
        let exists = assignments.iter().any(|stored| {
            stored.user_id == assignment.user_id
                && stored.role == assignment.role
                && stored.scope.organization_id == assignment.scope.organization_id
                && stored.scope.workspace_id == assignment.scope.workspace_id
                && stored.scope.facility_id == assignment.scope.facility_id
                && stored.scope.department_id == assignment.scope.department_id
        });
        if exists {
            debug!(
                user_id = %assignment.user_id,
                role = assignment.role.as_str(),
                specialty_id = ?assignment.scope.specialty_id,
                "role assignment already present, specialty left unchanged"
            );
        } else {
            assignments.insert(assignment.clone());
        }
        Ok(())
    }

    async fn list_active_leave_type_ids(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<Uuid>> {
        Ok(self
            .leave_types
            .read()
            .await
            .get(&organization_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn ensure_leave_balance(
        &self,
        user_id: UserId,
        leave_type_id: Uuid,
        year: i32,
    ) -> AppResult<LeaveBalanceInit> {
        let inserted = self
            .leave_balances
            .write()
            .await
            .insert((user_id, leave_type_id, year));

        Ok(if inserted {
            LeaveBalanceInit::Created
        } else {
            LeaveBalanceInit::AlreadyPresent
        })
    }
}

#[async_trait]
impl AccountProvider for InMemoryPlanivoStore {
    async fn create_account(&self, account: NewAccount<'_>) -> AppResult<AccountCreation> {
        validate_password(account.password)?;

        let key = account.email.to_lowercase();
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            return Ok(AccountCreation::AlreadyExists);
        }

        let user_id = UserId::new();
        accounts.insert(key, user_id);
        Ok(AccountCreation::Created(user_id))
    }

    async fn find_account_id_by_email(&self, email: &str) -> AppResult<Option<UserId>> {
        Ok(self
            .accounts
            .read()
            .await
            .get(&email.to_lowercase())
            .copied())
    }
}
