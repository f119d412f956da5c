use planivo_application::{BatchReport, RowFailure};
use planivo_domain::ImportRowInput;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// One user row of a bulk import request.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(default)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/import-row-request.ts"
)]
pub struct ImportRowRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub organization_name: Option<String>,
    pub workspace_name: Option<String>,
    pub facility_name: Option<String>,
    pub department_name: Option<String>,
    pub specialty_name: Option<String>,
    pub role: Option<String>,
}

impl From<ImportRowRequest> for ImportRowInput {
    fn from(value: ImportRowRequest) -> Self {
        Self {
            email: value.email,
            full_name: value.full_name,
            organization_name: value.organization_name,
            workspace_name: value.workspace_name,
            facility_name: value.facility_name,
            department_name: value.department_name,
            specialty_name: value.specialty_name,
            role: value.role,
        }
    }
}

/// Incoming payload for a JSON bulk import.
#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/bulk-import-users-request.ts"
)]
pub struct BulkImportUsersRequest {
    pub users: Vec<ImportRowRequest>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub organization_id: Option<Uuid>,
    #[serde(default)]
    #[ts(type = "number | null")]
    pub timeout_seconds: Option<u64>,
}

/// Query string of a CSV bulk import.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkImportCsvQuery {
    pub organization_id: Option<Uuid>,
    pub timeout_seconds: Option<u64>,
}

/// One failed row in a bulk import response.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/import-row-failure-response.ts"
)]
pub struct ImportRowFailureResponse {
    #[ts(type = "number")]
    pub row: usize,
    pub email: String,
    pub error: String,
}

impl From<RowFailure> for ImportRowFailureResponse {
    fn from(value: RowFailure) -> Self {
        Self {
            row: value.row,
            email: value.email,
            error: value.error,
        }
    }
}

/// Outcome of a bulk import call.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/bulk-import-response.ts"
)]
pub struct BulkImportResponse {
    #[ts(type = "number")]
    pub success: usize,
    #[ts(type = "number")]
    pub failed: usize,
    pub errors: Vec<ImportRowFailureResponse>,
    #[ts(type = "number")]
    pub created: usize,
    #[ts(type = "number")]
    pub reused: usize,
    pub timed_out: bool,
    #[ts(type = "number")]
    pub not_attempted: usize,
}

impl From<BatchReport> for BulkImportResponse {
    fn from(value: BatchReport) -> Self {
        Self {
            success: value.success,
            failed: value.failed,
            errors: value
                .errors
                .into_iter()
                .map(ImportRowFailureResponse::from)
                .collect(),
            created: value.created,
            reused: value.reused,
            timed_out: value.timed_out,
            not_attempted: value.not_attempted,
        }
    }
}
