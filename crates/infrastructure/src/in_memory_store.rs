//! In-memory implementation of every import port, used by service and handler tests.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use planivo_application::{AuditEvent, ProfileUpsert, RoleAssignmentUpsert, RoleGrant};
use planivo_core::{CallerIdentity, OrganizationId};
use planivo_domain::{Role, UserId};

mod access;
mod directory;
mod provisioning;


#[derive(Debug, Clone)]
struct WorkspaceEntry {
    organization_id: OrganizationId,
    name: String,
}

#[derive(Debug, Clone)]
struct FacilityEntry {
    workspace_id: Uuid,
    name: String,
}

#[derive(Debug, Clone)]
struct DepartmentEntry {
    facility_id: Uuid,
    parent_id: Option<Uuid>,
    name: String,
}

/// In-memory store backing the directory, provisioning, account, session,
/// role, rate limit and audit ports.
#[derive(Debug, Default)]
pub struct InMemoryPlanivoStore {
    organizations: RwLock<HashMap<OrganizationId, (String, bool)>>,
    workspaces: RwLock<HashMap<Uuid, WorkspaceEntry>>,
    facilities: RwLock<HashMap<Uuid, FacilityEntry>>,
    departments: RwLock<HashMap<Uuid, DepartmentEntry>>,
    leave_types: RwLock<HashMap<OrganizationId, Vec<Uuid>>>,
    accounts: RwLock<HashMap<String, UserId>>,
    profiles: RwLock<HashMap<UserId, ProfileUpsert>>,
    role_assignments: RwLock<HashSet<RoleAssignmentUpsert>>,
    leave_balances: RwLock<HashSet<(UserId, Uuid, i32)>>,
    sessions: RwLock<HashMap<String, CallerIdentity>>,
    grants: RwLock<HashMap<Uuid, Vec<RoleGrant>>>,
    rate_limits: RwLock<HashMap<String, (i32, DateTime<Utc>)>>,
    audit_events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryPlanivoStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an active organization and returns its identifier.
    pub async fn add_organization(&self, name: &str) -> OrganizationId {
        let organization_id = OrganizationId::new();
        self.organizations
            .write()
            .await
            .insert(organization_id, (name.to_owned(), true));
        organization_id
    }

    /// Marks an organization inactive. Inactive organizations never resolve.
    pub async fn deactivate_organization(&self, organization_id: OrganizationId) {
        if let Some((_, active)) = self.organizations.write().await.get_mut(&organization_id) {
            *active = false;
        }
    }

    /// Adds a workspace to an organization.
    pub async fn add_workspace(&self, organization_id: OrganizationId, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.workspaces.write().await.insert(
            id,
            WorkspaceEntry {
                organization_id,
                name: name.to_owned(),
            },
        );
        id
    }

    /// Adds a facility to a workspace.
    pub async fn add_facility(&self, workspace_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.facilities.write().await.insert(
            id,
            FacilityEntry {
                workspace_id,
                name: name.to_owned(),
            },
        );
        id
    }

    /// Adds a department to a facility. A parent makes it a specialty.
    pub async fn add_department(
        &self,
        facility_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.departments.write().await.insert(
            id,
            DepartmentEntry {
                facility_id,
                parent_id,
                name: name.to_owned(),
            },
        );
        id
    }

    /// Adds an active leave type to an organization.
    pub async fn add_leave_type(&self, organization_id: OrganizationId) -> Uuid {
        let id = Uuid::new_v4();
        self.leave_types
            .write()
            .await
            .entry(organization_id)
            .or_default()
            .push(id);
        id
    }

    /// Registers a bearer session for a caller under the given token hash.
    pub async fn add_session(&self, token_hash: &str, caller: CallerIdentity) {
        self.sessions
            .write()
            .await
            .insert(token_hash.to_owned(), caller);
    }

    /// Grants a role to a caller.
    pub async fn grant_role(
        &self,
        user_id: Uuid,
        role: Role,
        organization_id: Option<OrganizationId>,
    ) {
        self.grants
            .write()
            .await
            .entry(user_id)
            .or_default()
            .push(RoleGrant {
                role,
                organization_id,
            });
    }

    /// Number of login accounts.
    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Number of profiles.
    pub async fn profile_count(&self) -> usize {
        self.profiles.read().await.len()
    }

    /// Number of distinct role assignments.
    pub async fn role_assignment_count(&self) -> usize {
        self.role_assignments.read().await.len()
    }

    /// Role assignments held by a user.
    pub async fn role_assignments_of(&self, user_id: UserId) -> Vec<RoleAssignmentUpsert> {
        self.role_assignments
            .read()
            .await
            .iter()
            .filter(|assignment| assignment.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Number of leave balance rows.
    pub async fn leave_balance_count(&self) -> usize {
        self.leave_balances.read().await.len()
    }

    /// Audit events appended so far, oldest first.
    pub async fn audit_events(&self) -> Vec<AuditEvent> {
        self.audit_events.read().await.clone()
    }
}
