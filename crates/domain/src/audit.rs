/// Stable audit action identifiers written by application services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    /// A bulk user import batch was processed.
    UsersBulkImported,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UsersBulkImported => "users.bulk_imported",
        }
    }
}
