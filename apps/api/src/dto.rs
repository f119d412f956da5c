mod common;
mod user_import;

pub use common::{HealthDependencyStatus, HealthResponse};
pub use user_import::{
    BulkImportCsvQuery, BulkImportResponse, BulkImportUsersRequest, ImportRowFailureResponse,
    ImportRowRequest,
};
