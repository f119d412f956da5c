use super::checks::{check_postgres, check_redis};
use super::*;

/// Liveness plus dependency checks. Redis only counts when the rate limiter uses it.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let postgres = check_postgres(&state.postgres_pool).await;
    let redis = check_redis(state.redis_client.as_ref(), state.redis_required).await;

    let ready = postgres.is_ok() && (redis.is_ok() || !state.redis_required);
    let (http_status, status) = if ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        http_status,
        Json(HealthResponse {
            status,
            ready,
            postgres,
            redis,
        }),
    )
}
