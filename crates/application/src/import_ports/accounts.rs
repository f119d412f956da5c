use async_trait::async_trait;
use planivo_core::AppResult;
use planivo_domain::UserId;

/// Account creation request.
#[derive(Clone, Copy)]
pub struct NewAccount<'a> {
    /// Normalized email.
    pub email: &'a str,
    /// Initial plaintext password.
    pub password: &'a str,
    /// Display name stored in account metadata.
    pub full_name: &'a str,
}

impl std::fmt::Debug for NewAccount<'_> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("NewAccount")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("full_name", &self.full_name)
            .finish()
    }
}

/// Outcome of an account creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountCreation {
    /// A new account was created.
    Created(UserId),
    /// An account with this email already exists.
    AlreadyExists,
}

/// Port to the identity platform that owns login accounts.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    /// Creates an account. Reports an email conflict as `AlreadyExists`.
    async fn create_account(&self, account: NewAccount<'_>) -> AppResult<AccountCreation>;

    /// Finds an existing account identifier by normalized email.
    async fn find_account_id_by_email(&self, email: &str) -> AppResult<Option<UserId>>;
}
