//! Local account table used when no hosted identity platform is configured.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use planivo_application::{AccountCreation, AccountProvider, NewAccount};
use planivo_core::{AppError, AppResult};
use planivo_domain::{UserId, validate_password};

use crate::Argon2PasswordHasher;

/// PostgreSQL implementation of the account provider port over `auth_users`.
#[derive(Clone)]
pub struct PostgresAccountProvider {
    pool: PgPool,
    hasher: Argon2PasswordHasher,
}

impl PostgresAccountProvider {
    /// Creates a provider with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            hasher: Argon2PasswordHasher::new(),
        }
    }
}

#[async_trait]
impl AccountProvider for PostgresAccountProvider {
    async fn create_account(&self, account: NewAccount<'_>) -> AppResult<AccountCreation> {
        validate_password(account.password)?;
        let password_hash = self.hasher.hash_password(account.password)?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO auth_users (email, password_hash, full_name, email_confirmed)
            VALUES (LOWER($1), $2, $3, TRUE)
            ON CONFLICT ((LOWER(email))) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(account.email)
        .bind(password_hash)
        .bind(account.full_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create account: {error}")))?;

        match id {
            Some(id) => {
                info!(user_id = %id, "account created");
                Ok(AccountCreation::Created(UserId::from_uuid(id)))
            }
            None => Ok(AccountCreation::AlreadyExists),
        }
    }

    async fn find_account_id_by_email(&self, email: &str) -> AppResult<Option<UserId>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM auth_users WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find account: {error}")))?;

        Ok(id.map(UserId::from_uuid))
    }
}
