use std::sync::Arc;

use planivo_application::{
    AuthorizationService, BulkImportService, BulkImportSettings, SessionService,
};
use planivo_core::AppError;
use planivo_infrastructure::{
    PostgresAuditRepository, PostgresCallerRoleRepository, PostgresDirectoryRepository,
    PostgresProvisioningRepository, PostgresSessionRepository,
};
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

use super::email::build_welcome_notifier;
use super::redis::build_redis_client;

mod accounts;
mod caches;

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let redis_client = config
        .redis_url
        .as_deref()
        .map(build_redis_client)
        .transpose()?;

    let rate_limit_service = caches::build_rate_limit_service(&pool, config, redis_client.clone())?;
    caches::spawn_rate_limit_cleanup(rate_limit_service.clone());
    let account_provider = accounts::build_account_provider(&pool, config)?;
    let notifier = build_welcome_notifier(config)?;

    let bulk_import_service = BulkImportService::new(
        AuthorizationService::new(Arc::new(PostgresCallerRoleRepository::new(pool.clone()))),
        rate_limit_service,
        Arc::new(PostgresDirectoryRepository::new(pool.clone())),
        Arc::new(PostgresProvisioningRepository::new(pool.clone())),
        account_provider,
        Arc::new(PostgresAuditRepository::new(pool.clone())),
    )
    .with_notifier(notifier)
    .with_settings(BulkImportSettings {
        rate_limit: config.import_rate_limit.clone(),
        max_timeout: config.import_max_timeout,
    });

    Ok(AppState {
        session_service: SessionService::new(Arc::new(PostgresSessionRepository::new(
            pool.clone(),
        ))),
        bulk_import_service,
        postgres_pool: pool,
        redis_client,
        redis_required: config.redis_required(),
    })
}
