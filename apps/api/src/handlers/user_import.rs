use std::time::Duration;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Extension, Query, State};
use planivo_application::BulkImportRequest;
use planivo_core::{AppError, CallerIdentity, FieldViolation, OrganizationId};
use planivo_domain::ImportRowInput;

use crate::dto::{BulkImportCsvQuery, BulkImportResponse, BulkImportUsersRequest};
use crate::error::ApiResult;
use crate::state::AppState;

mod csv_rows;


pub async fn bulk_import_users_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    payload: Result<Json<BulkImportUsersRequest>, JsonRejection>,
) -> ApiResult<Json<BulkImportResponse>> {
    state.bulk_import_service.require_importer(&caller).await?;
    let Json(payload) =
        payload.map_err(|rejection| malformed_request("body", rejection.body_text()))?;

    let request = BulkImportRequest {
        users: payload.users.into_iter().map(ImportRowInput::from).collect(),
        organization_id: payload.organization_id.map(OrganizationId::from_uuid),
        timeout: payload.timeout_seconds.map(Duration::from_secs),
    };

    import_users(&state, &caller, request).await
}

/// Accepts `text/csv` with a header row. Row 1 is the header, data rows start at 2.
pub async fn bulk_import_users_csv_handler(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    query: Result<Query<BulkImportCsvQuery>, QueryRejection>,
    body: Bytes,
) -> ApiResult<Json<BulkImportResponse>> {
    state.bulk_import_service.require_importer(&caller).await?;
    let Query(query) = query.map_err(|rejection| malformed_request("query", rejection.body_text()))?;

    let request = BulkImportRequest {
        users: csv_rows::parse_import_csv(&body)?,
        organization_id: query.organization_id.map(OrganizationId::from_uuid),
        timeout: query.timeout_seconds.map(Duration::from_secs),
    };

    import_users(&state, &caller, request).await
}

async fn import_users(
    state: &AppState,
    caller: &CallerIdentity,
    request: BulkImportRequest,
) -> ApiResult<Json<BulkImportResponse>> {
    let report = state
        .bulk_import_service
        .import_users(caller, request)
        .await?;

    Ok(Json(BulkImportResponse::from(report)))
}

fn malformed_request(field: &str, message: String) -> AppError {
    AppError::InvalidInput(vec![FieldViolation::new(field, message)])
}
