//! Bearer access token verification.

use std::sync::Arc;

use async_trait::async_trait;
use planivo_core::{AppError, AppResult, CallerIdentity};

/// Repository port resolving hashed access tokens to callers.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Returns the caller owning a live (unexpired, unrevoked) session.
    async fn find_active_session(&self, token_hash: &str) -> AppResult<Option<CallerIdentity>>;
}

/// Application service authenticating bearer credentials.
#[derive(Clone)]
pub struct SessionService {
    repository: Arc<dyn SessionRepository>,
}

impl SessionService {
    /// Creates a new session service.
    #[must_use]
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    /// Authenticates an `Authorization` header value of the form `Bearer <token>`.
    pub async fn authenticate(&self, authorization: Option<&str>) -> AppResult<CallerIdentity> {
        let token = authorization
            .and_then(|value| {
                let (scheme, token) = value.trim().split_once(' ')?;
                scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
            })
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Unauthorized("bearer token required".to_owned()))?;

        self.repository
            .find_active_session(&hash_access_token(token))
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid or expired access token".to_owned()))
    }
}

/// Computes the SHA-256 hex digest under which access tokens are stored.
#[must_use]
pub fn hash_access_token(raw_token: &str) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write;

    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    let result = hasher.finalize();

    result
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use planivo_core::{AppError, AppResult, CallerIdentity};
    use uuid::Uuid;

    use super::{SessionRepository, SessionService, hash_access_token};

    struct FakeSessionRepository {
        sessions: HashMap<String, CallerIdentity>,
    }

    #[async_trait]
    impl SessionRepository for FakeSessionRepository {
        async fn find_active_session(
            &self,
            token_hash: &str,
        ) -> AppResult<Option<CallerIdentity>> {
            Ok(self.sessions.get(token_hash).cloned())
        }
    }

    fn service_with_token(token: &str, caller: CallerIdentity) -> SessionService {
        SessionService::new(Arc::new(FakeSessionRepository {
            sessions: HashMap::from([(hash_access_token(token), caller)]),
        }))
    }

    #[tokio::test]
    async fn bearer_token_resolves_caller() {
        let caller = CallerIdentity::new(Uuid::new_v4(), Some("admin@x.com".to_owned()));
        let service = service_with_token("secret-token", caller.clone());

        let resolved = service.authenticate(Some("Bearer secret-token")).await;
        assert_eq!(resolved.ok(), Some(caller.clone()));

        let lowercase_scheme = service.authenticate(Some("bearer secret-token")).await;
        assert_eq!(lowercase_scheme.ok(), Some(caller));
    }

    #[tokio::test]
    async fn missing_or_unknown_tokens_are_unauthorized() {
        let service = service_with_token("secret-token", CallerIdentity::new(Uuid::new_v4(), None));

        for header in [None, Some(""), Some("Basic abc"), Some("Bearer "), Some("Bearer nope")] {
            let result = service.authenticate(header).await;
            assert!(
                matches!(result, Err(AppError::Unauthorized(_))),
                "header {header:?} should be rejected"
            );
        }
    }

    #[test]
    fn token_hash_is_hex_sha256() {
        let hash = hash_access_token("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
