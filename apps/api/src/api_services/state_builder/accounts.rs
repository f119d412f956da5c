use std::sync::Arc;
use std::time::Duration;

use planivo_application::AccountProvider;
use planivo_core::{AppError, AppResult};
use planivo_infrastructure::{HttpAccountProvider, PostgresAccountProvider};
use sqlx::PgPool;

use crate::api_config::{AccountProviderConfig, ApiConfig};

const AUTH_ADMIN_TIMEOUT: Duration = Duration::from_secs(15);

pub(super) fn build_account_provider(
    pool: &PgPool,
    config: &ApiConfig,
) -> AppResult<Arc<dyn AccountProvider>> {
    match &config.account_provider {
        AccountProviderConfig::Postgres => Ok(Arc::new(PostgresAccountProvider::new(pool.clone()))),
        AccountProviderConfig::Http {
            base_url,
            service_key,
        } => {
            let http_client = reqwest::Client::builder()
                .timeout(AUTH_ADMIN_TIMEOUT)
                .build()
                .map_err(|error| {
                    AppError::Internal(format!("failed to build auth admin HTTP client: {error}"))
                })?;
            Ok(Arc::new(HttpAccountProvider::new(
                http_client,
                base_url.clone(),
                service_key.clone(),
            )))
        }
    }
}
