use std::sync::Arc;
use std::time::Duration;

use planivo_application::{RateLimitRepository, RateLimitService};
use planivo_core::{AppError, AppResult};
use planivo_infrastructure::{PostgresRateLimitRepository, RedisRateLimitRepository};
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::api_config::{ApiConfig, RateLimitStoreConfig};

pub(super) fn build_rate_limit_service(
    pool: &PgPool,
    config: &ApiConfig,
    redis_client: Option<redis::Client>,
) -> AppResult<RateLimitService> {
    let rate_limit_repository: Arc<dyn RateLimitRepository> = match config.rate_limit_store {
        RateLimitStoreConfig::Postgres => Arc::new(PostgresRateLimitRepository::new(pool.clone())),
        RateLimitStoreConfig::Redis => {
            let redis_client = redis_client.ok_or_else(|| {
                AppError::Validation(
                    "REDIS_URL is required when RATE_LIMIT_BACKEND=redis".to_owned(),
                )
            })?;
            Arc::new(RedisRateLimitRepository::new(
                redis_client,
                "planivo:rate_limit",
            ))
        }
    };

    Ok(RateLimitService::new(rate_limit_repository))
}

const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Periodically purges expired rate limit windows for the life of the process.
pub(super) fn spawn_rate_limit_cleanup(rate_limit_service: RateLimitService) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match rate_limit_service.cleanup().await {
                Ok(removed) => debug!(removed, "expired rate limit entries purged"),
                Err(error) => warn!(error = %error, "rate limit cleanup failed"),
            }
        }
    });
}
