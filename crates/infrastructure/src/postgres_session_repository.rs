//! PostgreSQL-backed bearer session lookup over `api_sessions`.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use planivo_application::SessionRepository;
use planivo_core::{AppError, AppResult, CallerIdentity};

/// PostgreSQL implementation of the session repository port.
#[derive(Clone)]
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    user_id: Uuid,
    email: Option<String>,
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn find_active_session(&self, token_hash: &str) -> AppResult<Option<CallerIdentity>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT user_id, email
            FROM api_sessions
            WHERE token_hash = $1
              AND revoked_at IS NULL
              AND expires_at > now()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load session: {error}")))?;

        Ok(row.map(|row| CallerIdentity::new(row.user_id, row.email)))
    }
}
