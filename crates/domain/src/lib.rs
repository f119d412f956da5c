//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod import_row;
mod role;
mod scope;
mod user;

pub use audit::AuditAction;
pub use import_row::{
    FIRST_DATA_ROW_NUMBER, ImportRow, ImportRowInput, MAX_IMPORT_ROWS, validate_import_batch,
};
pub use role::{ADMINISTRATIVE_ROLES, Role};
pub use scope::ScopeContext;
pub use user::{
    EmailAddress, PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH, PASSWORD_SYMBOLS, UserId,
    validate_password,
};
