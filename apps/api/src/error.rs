use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use planivo_core::{AppError, FieldViolation};
use serde::Serialize;
use tracing::error;
use ts_rs::TS;

/// One violated request field constraint.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/field-violation-response.ts"
)]
pub struct FieldViolationResponse {
    pub field: String,
    pub message: String,
}

impl From<FieldViolation> for FieldViolationResponse {
    fn from(value: FieldViolation) -> Self {
        Self {
            field: value.field,
            message: value.message,
        }
    }
}

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    violations: Option<Vec<FieldViolationResponse>>,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::Validation(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "request failed");
        }

        let message = self.0.to_string();
        let violations = match self.0 {
            AppError::InvalidInput(violations) => Some(
                violations
                    .into_iter()
                    .map(FieldViolationResponse::from)
                    .collect(),
            ),
            _ => None,
        };

        (status, Json(ErrorResponse { message, violations })).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
