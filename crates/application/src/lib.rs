//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_ports;
mod authorization_service;
mod email_ports;
mod import_ports;
mod import_service;
mod rate_limit_service;
mod session_service;

pub use audit_ports::{AuditEvent, AuditRepository};
pub use authorization_service::{
    AdministrativeScope, AuthorizationService, CallerRoleRepository, RoleGrant,
};
pub use email_ports::EmailService;
pub use import_ports::{
    AccountCreation, AccountProvider, DirectoryRepository, ExistingProfile, FacilityMatch,
    LeaveBalanceInit, NewAccount, ProfileUpsert, ProvisioningRepository, RoleAssignmentUpsert,
};
pub use import_service::{
    BatchReport, BulkImportRequest, BulkImportService, BulkImportSettings,
    DEFAULT_MAX_IMPORT_TIMEOUT, GeneratedPassword,
    NameResolver, ResolutionCache, RowFailure, WelcomeNotifier, generate_password,
};
pub use rate_limit_service::{AttemptInfo, RateLimitRepository, RateLimitRule, RateLimitService};
pub use session_service::{SessionRepository, SessionService, hash_access_token};
