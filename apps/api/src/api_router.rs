use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use planivo_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

/// Largest accepted import body. 100 rows stay far below this.
const MAX_IMPORT_BODY_BYTES: usize = 1024 * 1024;

pub fn build_router(app_state: AppState, cors_allowed_origin: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/users/bulk-import",
            post(handlers::user_import::bulk_import_users_handler),
        )
        .route(
            "/api/users/bulk-import/csv",
            post(handlers::user_import::bulk_import_users_csv_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_IMPORT_BODY_BYTES))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(cors_allowed_origin)?)
        .with_state(app_state))
}
