use std::future::Future;
use std::time::Duration;

use redis::AsyncCommands;

use super::*;

const CHECK_TIMEOUT: Duration = Duration::from_secs(2);

impl HealthDependencyStatus {
    pub(super) fn ok() -> Self {
        Self {
            status: "ok",
            detail: None,
        }
    }

    pub(super) fn disabled() -> Self {
        Self {
            status: "disabled",
            detail: None,
        }
    }

    pub(super) fn error(detail: String) -> Self {
        Self {
            status: "error",
            detail: Some(detail),
        }
    }

    pub(super) fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

async fn with_deadline<F>(dependency: &str, check: F) -> HealthDependencyStatus
where
    F: Future<Output = HealthDependencyStatus>,
{
    tokio::time::timeout(CHECK_TIMEOUT, check)
        .await
        .unwrap_or_else(|_| {
            HealthDependencyStatus::error(format!(
                "{dependency} check timed out after {}s",
                CHECK_TIMEOUT.as_secs()
            ))
        })
}

pub(super) async fn check_postgres(pool: &sqlx::PgPool) -> HealthDependencyStatus {
    with_deadline("postgres", async {
        match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
            Ok(_) => HealthDependencyStatus::ok(),
            Err(error) => HealthDependencyStatus::error(format!("postgres check failed: {error}")),
        }
    })
    .await
}

pub(super) async fn check_redis(
    redis_client: Option<&redis::Client>,
    redis_required: bool,
) -> HealthDependencyStatus {
    let Some(redis_client) = redis_client else {
        return if redis_required {
            HealthDependencyStatus::error("redis client is not configured".to_owned())
        } else {
            HealthDependencyStatus::disabled()
        };
    };

    with_deadline("redis", async {
        let mut connection = match redis_client.get_multiplexed_async_connection().await {
            Ok(connection) => connection,
            Err(error) => {
                return HealthDependencyStatus::error(format!("redis connection failed: {error}"));
            }
        };

        match connection.ping::<String>().await {
            Ok(value) if value.eq_ignore_ascii_case("pong") => HealthDependencyStatus::ok(),
            Ok(value) => {
                HealthDependencyStatus::error(format!("unexpected redis ping response: {value}"))
            }
            Err(error) => HealthDependencyStatus::error(format!("redis ping failed: {error}")),
        }
    })
    .await
}
