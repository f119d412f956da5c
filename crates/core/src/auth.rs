use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated caller resolved from a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    user_id: Uuid,
    email: Option<String>,
}

impl CallerIdentity {
    /// Creates a caller identity from the verified session subject.
    #[must_use]
    pub fn new(user_id: Uuid, email: Option<String>) -> Self {
        Self { user_id, email }
    }

    /// Returns the stable user identifier of the caller.
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Returns the subject string used for rate limit and audit keys.
    #[must_use]
    pub fn subject(&self) -> String {
        self.user_id.to_string()
    }

    /// Returns the caller email, if the session carried one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
}
