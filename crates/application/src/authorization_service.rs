//! Caller role grants and administrative access checks.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use planivo_core::{AppError, AppResult, CallerIdentity, OrganizationId};
use planivo_domain::Role;


/// One role held by a caller, optionally bound to an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleGrant {
    /// Granted role.
    pub role: Role,
    /// Organization the grant applies to. `None` for platform-wide grants.
    pub organization_id: Option<OrganizationId>,
}

/// Repository port listing the role grants of a caller.
#[async_trait]
pub trait CallerRoleRepository: Send + Sync {
    /// Returns every role grant held by the user.
    async fn list_role_grants(&self, user_id: uuid::Uuid) -> AppResult<Vec<RoleGrant>>;
}

/// Organizations an administrator may act upon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdministrativeScope {
    /// Platform administrator, unrestricted.
    Platform,
    /// Administrator of the listed organizations only.
    Organizations(BTreeSet<OrganizationId>),
}

impl AdministrativeScope {
    /// Whether the scope covers the organization.
    #[must_use]
    pub fn permits(&self, organization_id: OrganizationId) -> bool {
        match self {
            Self::Platform => true,
            Self::Organizations(organizations) => organizations.contains(&organization_id),
        }
    }
}

/// Application service for role-based access checks.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn CallerRoleRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(repository: Arc<dyn CallerRoleRepository>) -> Self {
        Self { repository }
    }

    /// Requires the caller to hold `super_admin`, `organization_admin` or
    /// `general_admin`, returning the organizations those grants cover.
    pub async fn require_administrator(
        &self,
        caller: &CallerIdentity,
    ) -> AppResult<AdministrativeScope> {
        let grants = self.repository.list_role_grants(caller.user_id()).await?;

        let mut organizations = BTreeSet::new();
        for grant in grants.iter().filter(|grant| grant.role.is_administrative()) {
            match (grant.role, grant.organization_id) {
                (Role::SuperAdmin, _) => return Ok(AdministrativeScope::Platform),
                (_, Some(organization_id)) => {
                    organizations.insert(organization_id);
                }
                (_, None) => {}
            }
        }

        if organizations.is_empty() {
            return Err(AppError::Forbidden(
                "an administrative role is required for this operation".to_owned(),
            ));
        }

        Ok(AdministrativeScope::Organizations(organizations))
    }
}
