//! Bulk user import: scope resolution, provisioning and batch reporting.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use planivo_core::{AppError, AppResult, CallerIdentity, OrganizationId};
use planivo_domain::{
    AuditAction, ImportRow, ImportRowInput, ScopeContext, UserId, validate_import_batch,
};
use tracing::{debug, info, warn};

use crate::import_ports::{
    AccountCreation, AccountProvider, DirectoryRepository, LeaveBalanceInit, NewAccount,
    ProfileUpsert, ProvisioningRepository, RoleAssignmentUpsert,
};
use crate::{
    AdministrativeScope, AuditEvent, AuditRepository, AuthorizationService, RateLimitRule,
    RateLimitService,
};

mod credentials;
mod notifier;
mod provisioner;
mod report;
mod resolver;

pub use credentials::{GeneratedPassword, generate_password};
pub use notifier::WelcomeNotifier;
pub use report::{BatchReport, RowFailure};
pub use resolver::{NameResolver, ResolutionCache};

use provisioner::{BatchContext, DefaultOrganization};
use report::{AccountOrigin, ProvisionedIdentity, RowOutcome};

/// Default and upper bound for the per-call deadline.
pub const DEFAULT_MAX_IMPORT_TIMEOUT: Duration = Duration::from_secs(120);

const MIN_IMPORT_TIMEOUT: Duration = Duration::from_secs(1);

/// Tunables of the bulk import service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkImportSettings {
    /// Quota applied per caller.
    pub rate_limit: RateLimitRule,
    /// Longest deadline a caller may request. Also the default deadline.
    pub max_timeout: Duration,
}

impl Default for BulkImportSettings {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitRule::bulk_user_import(),
            max_timeout: DEFAULT_MAX_IMPORT_TIMEOUT,
        }
    }
}

/// One bulk import call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkImportRequest {
    /// Rows in input order.
    pub users: Vec<ImportRowInput>,
    /// Organization used by rows without `organization_name`.
    pub organization_id: Option<OrganizationId>,
    /// Requested deadline for the whole call.
    pub timeout: Option<Duration>,
}

/// Application service importing batches of users.
#[derive(Clone)]
pub struct BulkImportService {
    authorization_service: AuthorizationService,
    rate_limit_service: RateLimitService,
    resolver: NameResolver,
    provisioning: Arc<dyn ProvisioningRepository>,
    accounts: Arc<dyn AccountProvider>,
    audit_repository: Arc<dyn AuditRepository>,
    notifier: WelcomeNotifier,
    settings: BulkImportSettings,
}

impl BulkImportService {
    /// Creates a bulk import service with default settings and no mail transport.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        rate_limit_service: RateLimitService,
        directory: Arc<dyn DirectoryRepository>,
        provisioning: Arc<dyn ProvisioningRepository>,
        accounts: Arc<dyn AccountProvider>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            rate_limit_service,
            resolver: NameResolver::new(directory),
            provisioning,
            accounts,
            audit_repository,
            notifier: WelcomeNotifier::disabled(),
            settings: BulkImportSettings::default(),
        }
    }

    /// Adds welcome email delivery for newly created accounts.
    #[must_use]
    pub fn with_notifier(mut self, notifier: WelcomeNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Overrides rate limit and deadline settings.
    #[must_use]
    pub fn with_settings(mut self, settings: BulkImportSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Fails with `Forbidden` unless the caller holds an administrative role.
    ///
    /// Request bodies are parsed only after this check.
    pub async fn require_importer(&self, caller: &CallerIdentity) -> AppResult<()> {
        self.authorization_service
            .require_administrator(caller)
            .await
            .map(|_| ())
    }

    /// Imports a batch of users on behalf of an administrator.
    ///
    /// Authorization, rate limit and payload validation are checked before
    /// any row runs and fail the whole call. Row failures are recorded in the
    /// report and never abort the batch.
    pub async fn import_users(
        &self,
        caller: &CallerIdentity,
        request: BulkImportRequest,
    ) -> AppResult<BatchReport> {
        let administrative_scope = self
            .authorization_service
            .require_administrator(caller)
            .await?;

        self.rate_limit_service
            .check_rate_limit(&self.settings.rate_limit, &caller.subject())
            .await?;

        let rows = validate_import_batch(&request.users)?;
        let timeout = self.effective_timeout(request.timeout);
        let deadline = tokio::time::Instant::now() + timeout;

        info!(
            caller = %caller.subject(),
            rows = rows.len(),
            organization_id = ?request.organization_id,
            timeout_seconds = timeout.as_secs(),
            "bulk user import started"
        );

        let mut context = BatchContext {
            caller,
            administrative_scope,
            default_organization: request
                .organization_id
                .map_or(DefaultOrganization::Absent, DefaultOrganization::Unverified),
            cache: ResolutionCache::default(),
        };

        let mut report = BatchReport::default();
        for (index, row) in rows.iter().enumerate() {
            // Checked between rows only. A started row owns a generated
            // credential that must reach the notifier.
            if tokio::time::Instant::now() >= deadline {
                report.mark_timed_out(rows.len() - index);
                warn!(
                    row = row.row_number(),
                    not_attempted = report.not_attempted,
                    "bulk user import deadline reached"
                );
                break;
            }

            let outcome = self.import_row(&mut context, row).await;
            report.record(&outcome);
        }

        info!(
            caller = %caller.subject(),
            success = report.success,
            failed = report.failed,
            created = report.created,
            reused = report.reused,
            timed_out = report.timed_out,
            cached_lookups = context.cache.len(),
            "bulk user import finished"
        );

        self.record_audit(caller, request.organization_id, &report)
            .await;

        Ok(report)
    }

    fn effective_timeout(&self, requested: Option<Duration>) -> Duration {
        let max_timeout = self.settings.max_timeout.max(MIN_IMPORT_TIMEOUT);
        requested
            .unwrap_or(max_timeout)
            .clamp(MIN_IMPORT_TIMEOUT, max_timeout)
    }

    async fn record_audit(
        &self,
        caller: &CallerIdentity,
        organization_id: Option<OrganizationId>,
        report: &BatchReport,
    ) {
        let detail = serde_json::json!({
            "success": report.success,
            "failed": report.failed,
            "created": report.created,
            "reused": report.reused,
            "timed_out": report.timed_out,
            "not_attempted": report.not_attempted,
        });

        let event = AuditEvent {
            organization_id,
            subject: caller.subject(),
            action: AuditAction::UsersBulkImported,
            resource_type: "user_import_batch".to_owned(),
            resource_id: uuid::Uuid::new_v4().to_string(),
            detail: Some(detail.to_string()),
        };

        if let Err(error) = self.audit_repository.append_event(event).await {
            warn!(error = %error, "failed to append bulk import audit event");
        }
    }
}

#[cfg(test)]
mod tests;
