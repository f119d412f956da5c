use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use planivo_core::{AppError, AppResult, CallerIdentity, OrganizationId};
use planivo_domain::{ImportRowInput, Role, UserId};

use crate::import_ports::{
    AccountCreation, AccountProvider, DirectoryRepository, ExistingProfile, FacilityMatch,
    LeaveBalanceInit, NewAccount, ProfileUpsert, ProvisioningRepository, RoleAssignmentUpsert,
};
use crate::{
    AttemptInfo, AuditEvent, AuditRepository, AuthorizationService, CallerRoleRepository,
    EmailService, RateLimitRepository, RateLimitRule, RateLimitService, RoleGrant,
};

use super::{BulkImportRequest, BulkImportService, BulkImportSettings, WelcomeNotifier};

#[derive(Clone)]
struct Facility {
    id: Uuid,
    workspace_id: Uuid,
    name: String,
}

#[derive(Clone)]
struct Department {
    id: Uuid,
    facility_id: Uuid,
    parent_id: Option<Uuid>,
    name: String,
}

#[derive(Default)]
struct Directory {
    organizations: Vec<(OrganizationId, String)>,
    workspaces: Vec<(Uuid, OrganizationId, String)>,
    facilities: Vec<Facility>,
    departments: Vec<Department>,
}

#[derive(Default)]
struct Lookups {
    organizations: usize,
    organization_checks: usize,
    facilities: usize,
}

#[derive(Default)]
struct FakeStore {
    directory: Mutex<Directory>,
    lookups: Mutex<Lookups>,
    facility_delay: Option<Duration>,
    assignment_delay: Option<Duration>,
    accounts: Mutex<HashMap<String, UserId>>,
    profiles: Mutex<HashMap<UserId, ProfileUpsert>>,
    assignments: Mutex<HashSet<RoleAssignmentUpsert>>,
    assignment_writes: Mutex<usize>,
    leave_types: Mutex<HashMap<OrganizationId, Vec<Uuid>>>,
    balances: Mutex<HashSet<(UserId, Uuid, i32)>>,
    grants: Mutex<HashMap<Uuid, Vec<RoleGrant>>>,
    attempts: Mutex<HashMap<String, i32>>,
    audit_events: Mutex<Vec<AuditEvent>>,
    sent_emails: Mutex<Vec<(String, String)>>,
    fail_email: bool,
}

impl FakeStore {
    async fn add_organization(&self, name: &str) -> OrganizationId {
        let organization_id = OrganizationId::new();
        self.directory
            .lock()
            .await
            .organizations
            .push((organization_id, name.to_owned()));
        organization_id
    }

    async fn add_workspace(&self, organization_id: OrganizationId, name: &str) -> Uuid {
        let workspace_id = Uuid::new_v4();
        self.directory
            .lock()
            .await
            .workspaces
            .push((workspace_id, organization_id, name.to_owned()));
        workspace_id
    }

    async fn add_facility(&self, workspace_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.directory.lock().await.facilities.push(Facility {
            id,
            workspace_id,
            name: name.to_owned(),
        });
        id
    }

    async fn add_department(&self, facility_id: Uuid, parent_id: Option<Uuid>, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.directory.lock().await.departments.push(Department {
            id,
            facility_id,
            parent_id,
            name: name.to_owned(),
        });
        id
    }

    async fn grant(&self, user_id: Uuid, role: Role, organization_id: Option<OrganizationId>) {
        self.grants
            .lock()
            .await
            .entry(user_id)
            .or_default()
            .push(RoleGrant {
                role,
                organization_id,
            });
    }
}

#[async_trait]
impl DirectoryRepository for FakeStore {
    async fn find_organization_by_name(&self, name: &str) -> AppResult<Option<OrganizationId>> {
        self.lookups.lock().await.organizations += 1;
        Ok(self
            .directory
            .lock()
            .await
            .organizations
            .iter()
            .find(|(_, stored)| stored.eq_ignore_ascii_case(name))
            .map(|(organization_id, _)| *organization_id))
    }

    async fn organization_exists(&self, organization_id: OrganizationId) -> AppResult<bool> {
        self.lookups.lock().await.organization_checks += 1;
        Ok(self
            .directory
            .lock()
            .await
            .organizations
            .iter()
            .any(|(stored, _)| *stored == organization_id))
    }

    async fn find_workspace_by_name(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> AppResult<Option<Uuid>> {
        Ok(self
            .directory
            .lock()
            .await
            .workspaces
            .iter()
            .find(|(_, stored_org, stored)| {
                *stored_org == organization_id && stored.eq_ignore_ascii_case(name)
            })
            .map(|(workspace_id, _, _)| *workspace_id))
    }

    async fn find_facilities_by_name(
        &self,
        organization_id: OrganizationId,
        workspace_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Vec<FacilityMatch>> {
        if let Some(delay) = self.facility_delay {
            tokio::time::sleep(delay).await;
        }
        self.lookups.lock().await.facilities += 1;

        let directory = self.directory.lock().await;
        let organization_workspaces: HashSet<Uuid> = directory
            .workspaces
            .iter()
            .filter(|(_, stored_org, _)| *stored_org == organization_id)
            .map(|(id, _, _)| *id)
            .collect();

        Ok(directory
            .facilities
            .iter()
            .filter(|facility| organization_workspaces.contains(&facility.workspace_id))
            .filter(|facility| workspace_id.is_none_or(|id| id == facility.workspace_id))
            .filter(|facility| facility.name.eq_ignore_ascii_case(name))
            .map(|facility| FacilityMatch {
                facility_id: facility.id,
                workspace_id: facility.workspace_id,
            })
            .collect())
    }

    async fn find_department_by_name(
        &self,
        facility_id: Uuid,
        name: &str,
    ) -> AppResult<Option<Uuid>> {
        Ok(self
            .directory
            .lock()
            .await
            .departments
            .iter()
            .find(|department| {
                department.facility_id == facility_id
                    && department.parent_id.is_none()
                    && department.name.eq_ignore_ascii_case(name)
            })
            .map(|department| department.id))
    }

    async fn find_specialty_by_name(
        &self,
        department_id: Uuid,
        name: &str,
    ) -> AppResult<Option<Uuid>> {
        Ok(self
            .directory
            .lock()
            .await
            .departments
            .iter()
            .find(|department| {
                department.parent_id == Some(department_id)
                    && department.name.eq_ignore_ascii_case(name)
            })
            .map(|department| department.id))
    }
}

#[async_trait]
impl ProvisioningRepository for FakeStore {
    async fn find_profile_by_email(&self, email: &str) -> AppResult<Option<ExistingProfile>> {
        Ok(self
            .profiles
            .lock()
            .await
            .values()
            .find(|profile| profile.email == email)
            .map(|profile| ExistingProfile {
                user_id: profile.user_id,
                organization_id: Some(profile.organization_id),
            }))
    }

    async fn upsert_profile(&self, profile: &ProfileUpsert) -> AppResult<()> {
        self.profiles
            .lock()
            .await
            .insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn upsert_role_assignment(&self, assignment: &RoleAssignmentUpsert) -> AppResult<()> {
        if let Some(delay) = self.assignment_delay {
            tokio::time::sleep(delay).await;
        }
        *self.assignment_writes.lock().await += 1;
        self.assignments.lock().await.insert(assignment.clone());
        Ok(())
    }

    async fn list_active_leave_type_ids(
        &self,
        organization_id: OrganizationId,
    ) -> AppResult<Vec<Uuid>> {
        Ok(self
            .leave_types
            .lock()
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
        if self
            .balances
            .lock()
            .await
            .insert((user_id, leave_type_id, year))
        {
            Ok(LeaveBalanceInit::Created)
        } else {
            Ok(LeaveBalanceInit::AlreadyPresent)
        }
    }
}

#[async_trait]
impl AccountProvider for FakeStore {
    async fn create_account(&self, account: NewAccount<'_>) -> AppResult<AccountCreation> {
        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(account.email) {
            return Ok(AccountCreation::AlreadyExists);
        }

        let user_id = UserId::new();
        accounts.insert(account.email.to_owned(), user_id);
        Ok(AccountCreation::Created(user_id))
    }

    async fn find_account_id_by_email(&self, email: &str) -> AppResult<Option<UserId>> {
        Ok(self.accounts.lock().await.get(email).copied())
    }
}

#[async_trait]
impl CallerRoleRepository for FakeStore {
    async fn list_role_grants(&self, user_id: Uuid) -> AppResult<Vec<RoleGrant>> {
        Ok(self
            .grants
            .lock()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl RateLimitRepository for FakeStore {
    async fn record_attempt(
        &self,
        key: &str,
        _window_duration_seconds: i64,
    ) -> AppResult<AttemptInfo> {
        let mut attempts = self.attempts.lock().await;
        let count = attempts.entry(key.to_owned()).or_insert(0);
        *count += 1;
        Ok(AttemptInfo {
            attempt_count: *count,
            window_started_at: Utc::now(),
        })
    }

    async fn cleanup_expired(&self, _before: DateTime<Utc>) -> AppResult<u64> {
        Ok(0)
    }
}

#[async_trait]
impl AuditRepository for FakeStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.audit_events.lock().await.push(event);
        Ok(())
    }
}

#[async_trait]
impl EmailService for FakeStore {
    async fn send_email(
        &self,
        to: &str,
        _subject: &str,
        text_body: &str,
        _html_body: Option<&str>,
    ) -> AppResult<()> {
        if self.fail_email {
            return Err(AppError::Internal("smtp relay unavailable".to_owned()));
        }
        self.sent_emails
            .lock()
            .await
            .push((to.to_owned(), text_body.to_owned()));
        Ok(())
    }
}

struct Fixture {
    store: Arc<FakeStore>,
    service: BulkImportService,
    admin: CallerIdentity,
    acme: OrganizationId,
    north: Uuid,
    icu: Uuid,
    nursing: Uuid,
}

async fn fixture_with(store: FakeStore) -> Fixture {
    let store = Arc::new(store);
    let acme = store.add_organization("Acme Health").await;
    let north = store.add_workspace(acme, "North").await;
    let icu = store.add_facility(north, "F1").await;
    let nursing = store.add_department(icu, None, "Nursing").await;
    store.add_department(icu, Some(nursing), "Pediatrics").await;

    let admin = CallerIdentity::new(Uuid::new_v4(), Some("admin@acme.test".to_owned()));
    store.grant(admin.user_id(), Role::SuperAdmin, None).await;

    let service = BulkImportService::new(
        AuthorizationService::new(store.clone()),
        RateLimitService::new(store.clone()),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
    )
    .with_notifier(WelcomeNotifier::new(
        store.clone(),
        Some("https://app.planivo.test/login".to_owned()),
    ))
    .with_settings(BulkImportSettings {
        rate_limit: RateLimitRule::new("bulk_user_import", 50, 300),
        ..BulkImportSettings::default()
    });

    Fixture {
        store,
        service,
        admin,
        acme,
        north,
        icu,
        nursing,
    }
}

async fn fixture() -> Fixture {
    fixture_with(FakeStore::default()).await
}

fn row(email: &str, role: &str) -> ImportRowInput {
    ImportRowInput {
        email: Some(email.to_owned()),
        full_name: Some(format!("User {email}")),
        role: Some(role.to_owned()),
        ..ImportRowInput::default()
    }
}

fn staff_row(email: &str) -> ImportRowInput {
    ImportRowInput {
        facility_name: Some("F1".to_owned()),
        department_name: Some("Nursing".to_owned()),
        ..row(email, "staff")
    }
}

fn request(users: Vec<ImportRowInput>, organization_id: OrganizationId) -> BulkImportRequest {
    BulkImportRequest {
        users,
        organization_id: Some(organization_id),
        timeout: None,
    }
}

#[tokio::test]
async fn unresolvable_department_fails_the_row_with_its_name() {
    let fixture = fixture().await;
    let input = ImportRowInput {
        email: Some("a@x.com".to_owned()),
        full_name: Some("A".to_owned()),
        role: Some("staff".to_owned()),
        facility_name: Some("F1".to_owned()),
        department_name: Some("D1".to_owned()),
        ..ImportRowInput::default()
    };

    let report = fixture
        .service
        .import_users(&fixture.admin, request(vec![input], fixture.acme))
        .await;
    assert!(report.is_ok());
    let report = report.unwrap_or_else(|_| unreachable!());

    assert_eq!(report.success, 0);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 2);
    assert_eq!(report.errors[0].email, "a@x.com");
    assert!(report.errors[0].error.contains("D1"));
    assert!(fixture.store.accounts.lock().await.is_empty());
}

#[tokio::test]
async fn roles_needing_a_department_fail_without_one() {
    let fixture = fixture().await;
    let users: Vec<ImportRowInput> = ["staff", "intern", "department_head"]
        .into_iter()
        .enumerate()
        .map(|(index, role)| ImportRowInput {
            facility_name: Some("F1".to_owned()),
            ..row(format!("user{index}@x.com").as_str(), role)
        })
        .collect();

    let report = fixture
        .service
        .import_users(&fixture.admin, request(users, fixture.acme))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(report.success, 0);
    assert_eq!(report.failed, 3);
    assert!(
        report
            .errors
            .iter()
            .all(|failure| failure.error.starts_with("Department name is required"))
    );
    assert!(fixture.store.assignments.lock().await.is_empty());
}

#[tokio::test]
async fn success_and_failed_cover_every_row() {
    let fixture = fixture().await;
    let users = vec![
        staff_row("ok1@x.com"),
        row("no-workspace@x.com", "workplace_supervisor"),
        row("org-admin@x.com", "organization_admin"),
        ImportRowInput {
            facility_name: Some("Nowhere".to_owned()),
            ..staff_row("bad-facility@x.com")
        },
        ImportRowInput {
            workspace_name: Some("north".to_owned()),
            ..row("supervisor@x.com", "workspace_supervisor")
        },
    ];

    let report = fixture
        .service
        .import_users(&fixture.admin, request(users, fixture.acme))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(report.success + report.failed, 5);
    assert_eq!(report.success, 3);
    let failed_rows: Vec<usize> = report.errors.iter().map(|failure| failure.row).collect();
    assert_eq!(failed_rows, vec![3, 5]);
    assert!(report.errors[0].error.contains("Workspace name is required"));
    assert!(report.errors[1].error.contains("Nowhere"));
    assert!(!report.timed_out);
    assert_eq!(report.not_attempted, 0);
}

#[tokio::test]
async fn duplicate_email_in_one_batch_creates_one_identity() {
    let fixture = fixture().await;
    let users = vec![staff_row("twin@x.com"), staff_row("TWIN@x.com ")];

    let report = fixture
        .service
        .import_users(&fixture.admin, request(users, fixture.acme))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(report.success, 2);
    assert_eq!(report.created, 1);
    assert_eq!(report.reused, 1);
    assert_eq!(fixture.store.accounts.lock().await.len(), 1);
    assert_eq!(fixture.store.profiles.lock().await.len(), 1);
    assert_eq!(fixture.store.assignments.lock().await.len(), 1);
}

#[tokio::test]
async fn rerunning_a_batch_reuses_identities_and_assignments() {
    let fixture = fixture().await;
    fixture
        .store
        .leave_types
        .lock()
        .await
        .insert(fixture.acme, vec![Uuid::new_v4(), Uuid::new_v4()]);
    let users = vec![
        staff_row("a@x.com"),
        staff_row("b@x.com"),
        row("c@x.com", "general_admin"),
    ];

    let first = fixture
        .service
        .import_users(&fixture.admin, request(users.clone(), fixture.acme))
        .await
        .unwrap_or_else(|_| unreachable!());
    let identities_after_first = fixture.store.accounts.lock().await.len();
    let assignments_after_first = fixture.store.assignments.lock().await.len();
    let balances_after_first = fixture.store.balances.lock().await.len();

    let second = fixture
        .service
        .import_users(&fixture.admin, request(users, fixture.acme))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!((first.success, first.created, first.reused), (3, 3, 0));
    assert_eq!((second.success, second.created, second.reused), (3, 0, 3));
    assert_eq!(identities_after_first, 3);
    assert_eq!(fixture.store.accounts.lock().await.len(), 3);
    assert_eq!(assignments_after_first, 3);
    assert_eq!(fixture.store.assignments.lock().await.len(), 3);
    assert_eq!(*fixture.store.assignment_writes.lock().await, 6);
    assert_eq!(balances_after_first, 6);
    assert_eq!(fixture.store.balances.lock().await.len(), 6);
}

#[tokio::test]
async fn oversized_batch_is_rejected_before_any_row() {
    let fixture = fixture().await;
    let users: Vec<ImportRowInput> = (0..101)
        .map(|index| staff_row(format!("user{index}@x.com").as_str()))
        .collect();

    let result = fixture
        .service
        .import_users(&fixture.admin, request(users, fixture.acme))
        .await;

    assert!(matches!(result, Err(AppError::InvalidInput(_))));
    assert!(fixture.store.accounts.lock().await.is_empty());
    assert!(fixture.store.audit_events.lock().await.is_empty());
}

#[tokio::test]
async fn caller_without_admin_role_is_forbidden() {
    let fixture = fixture().await;
    let caller = CallerIdentity::new(Uuid::new_v4(), None);
    fixture
        .store
        .grant(caller.user_id(), Role::Staff, Some(fixture.acme))
        .await;

    let result = fixture
        .service
        .import_users(&caller, request(vec![staff_row("a@x.com")], fixture.acme))
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert!(fixture.store.accounts.lock().await.is_empty());
    assert!(fixture.store.attempts.lock().await.is_empty());
    assert_eq!(fixture.store.lookups.lock().await.facilities, 0);
}

#[tokio::test]
async fn exceeding_the_quota_rejects_the_call_before_any_row() {
    let fixture = fixture().await;
    let service = fixture.service.clone().with_settings(BulkImportSettings {
        rate_limit: RateLimitRule::new("bulk_user_import", 1, 300),
        ..BulkImportSettings::default()
    });

    let first = service
        .import_users(&fixture.admin, request(vec![staff_row("a@x.com")], fixture.acme))
        .await;
    let second = service
        .import_users(&fixture.admin, request(vec![staff_row("b@x.com")], fixture.acme))
        .await;

    assert!(first.is_ok());
    assert!(matches!(second, Err(AppError::RateLimited(_))));
    assert_eq!(fixture.store.accounts.lock().await.len(), 1);
}

#[tokio::test]
async fn missing_organization_context_fails_each_row() {
    let fixture = fixture().await;
    let report = fixture
        .service
        .import_users(
            &fixture.admin,
            BulkImportRequest {
                users: vec![
                    staff_row("a@x.com"),
                    ImportRowInput {
                        organization_name: Some("ACME HEALTH".to_owned()),
                        ..staff_row("b@x.com")
                    },
                ],
                organization_id: None,
                timeout: None,
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(report.success, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 2);
    assert_eq!(report.errors[0].error, "Organization context missing");
}

#[tokio::test]
async fn unknown_default_organization_is_checked_once() {
    let fixture = fixture().await;
    let users = vec![staff_row("a@x.com"), staff_row("b@x.com")];

    let report = fixture
        .service
        .import_users(&fixture.admin, request(users, OrganizationId::new()))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(report.failed, 2);
    assert!(report.errors.iter().all(|failure| failure.error.contains("not found")));
    assert_eq!(fixture.store.lookups.lock().await.organization_checks, 1);
}

#[tokio::test]
async fn organization_admin_cannot_import_into_other_organizations() {
    let fixture = fixture().await;
    let globex = fixture.store.add_organization("Globex").await;
    let caller = CallerIdentity::new(Uuid::new_v4(), None);
    fixture
        .store
        .grant(caller.user_id(), Role::OrganizationAdmin, Some(fixture.acme))
        .await;

    let users = vec![
        staff_row("a@x.com"),
        ImportRowInput {
            organization_name: Some("Globex".to_owned()),
            ..row("b@x.com", "general_admin")
        },
    ];
    let report = fixture
        .service
        .import_users(&caller, request(users, fixture.acme))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(report.success, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 3);
    assert!(report.errors[0].error.contains(&globex.to_string()));
}

#[tokio::test]
async fn organization_admin_cannot_take_over_profiles_of_other_organizations() {
    let fixture = fixture().await;
    let globex = fixture.store.add_organization("Globex").await;
    let seeded = fixture
        .service
        .import_users(
            &fixture.admin,
            request(vec![row("victim@x.com", "general_admin")], fixture.acme),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(seeded.created, 1);

    let globex_admin = CallerIdentity::new(Uuid::new_v4(), None);
    fixture
        .store
        .grant(globex_admin.user_id(), Role::OrganizationAdmin, Some(globex))
        .await;
    let renamed = ImportRowInput {
        full_name: Some("Renamed By Globex".to_owned()),
        ..row("victim@x.com", "general_admin")
    };

    let report = fixture
        .service
        .import_users(&globex_admin, request(vec![renamed], globex))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(report.success, 0);
    assert_eq!(report.failed, 1);
    assert!(report.errors[0].error.contains(&fixture.acme.to_string()));

    let profiles = fixture.store.profiles.lock().await;
    let profile = profiles.values().find(|profile| profile.email == "victim@x.com");
    assert_eq!(profile.map(|profile| profile.organization_id), Some(fixture.acme));
    assert_eq!(
        profile.map(|profile| profile.full_name.as_str()),
        Some("User victim@x.com")
    );
    assert_eq!(*fixture.store.assignment_writes.lock().await, 1);
}

#[tokio::test]
async fn facility_supplies_the_workspace_and_specialty_is_optional() {
    let fixture = fixture().await;
    let users = vec![
        ImportRowInput {
            specialty_name: Some("pediatrics".to_owned()),
            ..staff_row("a@x.com")
        },
        ImportRowInput {
            specialty_name: Some("Cardiology".to_owned()),
            ..staff_row("b@x.com")
        },
    ];

    let report = fixture
        .service
        .import_users(&fixture.admin, request(users, fixture.acme))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(report.success, 2);

    let assignments = fixture.store.assignments.lock().await;
    assert!(assignments.iter().all(|assignment| {
        assignment.scope.workspace_id == Some(fixture.north)
            && assignment.scope.facility_id == Some(fixture.icu)
            && assignment.scope.department_id == Some(fixture.nursing)
    }));
    let specialties: HashSet<bool> = assignments
        .iter()
        .map(|assignment| assignment.scope.specialty_id.is_some())
        .collect();
    assert_eq!(specialties, HashSet::from([true, false]));
}

#[tokio::test]
async fn facility_names_shared_across_workspaces_are_ambiguous() {
    let fixture = fixture().await;
    let south = fixture.store.add_workspace(fixture.acme, "South").await;
    fixture.store.add_facility(south, "F1").await;

    let users = vec![
        staff_row("a@x.com"),
        ImportRowInput {
            workspace_name: Some("North".to_owned()),
            ..staff_row("b@x.com")
        },
    ];
    let report = fixture
        .service
        .import_users(&fixture.admin, request(users, fixture.acme))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(report.success, 1);
    assert_eq!(report.errors[0].row, 2);
    assert!(report.errors[0].error.contains("matches 2 facilities"));
}

#[tokio::test]
async fn repeated_names_are_resolved_once_per_batch() {
    let fixture = fixture().await;
    let users: Vec<ImportRowInput> = (0..5)
        .map(|index| ImportRowInput {
            organization_name: Some("Acme Health".to_owned()),
            ..staff_row(format!("user{index}@x.com").as_str())
        })
        .collect();

    let report = fixture
        .service
        .import_users(&fixture.admin, request(users.clone(), fixture.acme))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(report.success, 5);
    assert_eq!(fixture.store.lookups.lock().await.organizations, 1);
    assert_eq!(fixture.store.lookups.lock().await.facilities, 1);

    let _ = fixture
        .service
        .import_users(&fixture.admin, request(users, fixture.acme))
        .await;
    assert_eq!(fixture.store.lookups.lock().await.facilities, 2);
}

#[tokio::test]
async fn existing_account_without_profile_is_reused() {
    let fixture = fixture().await;
    let existing = UserId::new();
    fixture
        .store
        .accounts
        .lock()
        .await
        .insert("legacy@x.com".to_owned(), existing);

    let report = fixture
        .service
        .import_users(&fixture.admin, request(vec![staff_row("legacy@x.com")], fixture.acme))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!((report.success, report.created, report.reused), (1, 0, 1));
    assert!(fixture.store.profiles.lock().await.contains_key(&existing));
    assert!(fixture.store.sent_emails.lock().await.is_empty());
}

#[tokio::test]
async fn welcome_email_carries_a_fresh_password_per_new_account() {
    let fixture = fixture().await;
    let users = vec![staff_row("a@x.com"), staff_row("b@x.com"), staff_row("a@x.com")];

    let report = fixture
        .service
        .import_users(&fixture.admin, request(users, fixture.acme))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(report.success, 3);

    let emails = fixture.store.sent_emails.lock().await;
    let recipients: Vec<&str> = emails.iter().map(|(to, _)| to.as_str()).collect();
    assert_eq!(recipients, vec!["a@x.com", "b@x.com"]);

    let passwords: HashSet<&str> = emails
        .iter()
        .filter_map(|(_, body)| body.lines().find(|line| line.starts_with("Temporary password:")))
        .collect();
    assert_eq!(passwords.len(), 2);
    assert!(emails[0].1.contains("https://app.planivo.test/login"));
}

#[tokio::test]
async fn email_delivery_failure_does_not_fail_the_row() {
    let fixture = fixture_with(FakeStore {
        fail_email: true,
        ..FakeStore::default()
    })
    .await;

    let report = fixture
        .service
        .import_users(&fixture.admin, request(vec![staff_row("a@x.com")], fixture.acme))
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(report.success, 1);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn accepted_batches_are_audited_once() {
    let fixture = fixture().await;
    let _ = fixture
        .service
        .import_users(&fixture.admin, request(vec![staff_row("a@x.com")], fixture.acme))
        .await;

    let events = fixture.store.audit_events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action.as_str(), "users.bulk_imported");
    assert_eq!(events[0].organization_id, Some(fixture.acme));
    assert_eq!(events[0].subject, fixture.admin.subject());
    assert!(
        events[0]
            .detail
            .as_deref()
            .is_some_and(|detail| detail.contains("\"success\":1"))
    );
}

#[tokio::test(start_paused = true)]
async fn deadline_stops_before_the_next_row() {
    let fixture = fixture_with(FakeStore {
        facility_delay: Some(Duration::from_secs(30)),
        ..FakeStore::default()
    })
    .await;
    let users = vec![
        row("admin@x.com", "general_admin"),
        staff_row("a@x.com"),
        staff_row("b@x.com"),
    ];

    let report = fixture
        .service
        .import_users(
            &fixture.admin,
            BulkImportRequest {
                users,
                organization_id: Some(fixture.acme),
                timeout: Some(Duration::from_secs(5)),
            },
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(report.success, 2);
    assert_eq!(report.failed, 0);
    assert!(report.timed_out);
    assert_eq!(report.not_attempted, 1);
    assert_eq!(report.reported_rows() + report.not_attempted, 3);
    assert_eq!(fixture.store.accounts.lock().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn deadline_inside_a_row_still_delivers_its_credential() {
    let fixture = fixture_with(FakeStore {
        assignment_delay: Some(Duration::from_secs(30)),
        ..FakeStore::default()
    })
    .await;
    let batch = || BulkImportRequest {
        users: vec![staff_row("a@x.com"), staff_row("b@x.com")],
        organization_id: Some(fixture.acme),
        timeout: Some(Duration::from_secs(5)),
    };

    let first = fixture
        .service
        .import_users(&fixture.admin, batch())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(first.success, 1);
    assert_eq!(first.created, 1);
    assert!(first.timed_out);
    assert_eq!(first.not_attempted, 1);
    {
        let emails = fixture.store.sent_emails.lock().await;
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].0, "a@x.com");
        assert!(emails[0].1.contains("Temporary password:"));
    }

    let second = fixture
        .service
        .import_users(&fixture.admin, batch())
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(second.reused, 1);
    assert_eq!(second.not_attempted, 1);
    assert_eq!(fixture.store.accounts.lock().await.len(), 1);
    assert_eq!(fixture.store.sent_emails.lock().await.len(), 1);
}

#[test]
fn requested_timeouts_are_clamped() {
    let settings = BulkImportSettings {
        max_timeout: Duration::from_secs(60),
        ..BulkImportSettings::default()
    };
    let store = Arc::new(FakeStore::default());
    let service = BulkImportService::new(
        AuthorizationService::new(store.clone()),
        RateLimitService::new(store.clone()),
        store.clone(),
        store.clone(),
        store.clone(),
        store,
    )
    .with_settings(settings);

    assert_eq!(service.effective_timeout(None), Duration::from_secs(60));
    assert_eq!(
        service.effective_timeout(Some(Duration::from_secs(600))),
        Duration::from_secs(60)
    );
    assert_eq!(
        service.effective_timeout(Some(Duration::ZERO)),
        Duration::from_secs(1)
    );
}
