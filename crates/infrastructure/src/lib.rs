//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod console_email_service;
mod http_account_provider;
mod in_memory_store;
mod postgres_account_provider;
mod postgres_audit_repository;
mod postgres_caller_role_repository;
mod postgres_directory_repository;
mod postgres_provisioning_repository;
mod postgres_rate_limit_repository;
mod postgres_session_repository;
mod redis_rate_limit_repository;
mod smtp_email_service;

#[cfg(test)]
mod test_support;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use console_email_service::ConsoleEmailService;
pub use http_account_provider::HttpAccountProvider;
pub use in_memory_store::InMemoryPlanivoStore;
pub use postgres_account_provider::PostgresAccountProvider;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_caller_role_repository::PostgresCallerRoleRepository;
pub use postgres_directory_repository::PostgresDirectoryRepository;
pub use postgres_provisioning_repository::PostgresProvisioningRepository;
pub use postgres_rate_limit_repository::PostgresRateLimitRepository;
pub use postgres_session_repository::PostgresSessionRepository;
pub use redis_rate_limit_repository::RedisRateLimitRepository;
pub use smtp_email_service::{SmtpEmailConfig, SmtpEmailService};

/// Embedded schema migrations for the PostgreSQL adapters.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
