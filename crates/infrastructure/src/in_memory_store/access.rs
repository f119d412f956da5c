use async_trait::async_trait;
use chrono::{DateTime, Utc};
use planivo_application::{
    AttemptInfo, AuditEvent, AuditRepository, CallerRoleRepository, RateLimitRepository,
    RoleGrant, SessionRepository,
};
use planivo_core::{AppResult, CallerIdentity};
use uuid::Uuid;

use super::InMemoryPlanivoStore;

#[async_trait]
impl SessionRepository for InMemoryPlanivoStore {
    async fn find_active_session(&self, token_hash: &str) -> AppResult<Option<CallerIdentity>> {
        Ok(self.sessions.read().await.get(token_hash).cloned())
    }
}

#[async_trait]
impl CallerRoleRepository for InMemoryPlanivoStore {
    async fn list_role_grants(&self, user_id: Uuid) -> AppResult<Vec<RoleGrant>> {
        Ok(self
            .grants
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl RateLimitRepository for InMemoryPlanivoStore {
    async fn record_attempt(
        &self,
        key: &str,
        window_duration_seconds: i64,
    ) -> AppResult<AttemptInfo> {
        let now = Utc::now();
        let mut rate_limits = self.rate_limits.write().await;
        let entry = rate_limits.entry(key.to_owned()).or_insert((0, now));

        if entry.1 + chrono::Duration::seconds(window_duration_seconds) < now {
            *entry = (0, now);
        }
        entry.0 += 1;

        Ok(AttemptInfo {
            attempt_count: entry.0,
            window_started_at: entry.1,
        })
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut rate_limits = self.rate_limits.write().await;
        let initial = rate_limits.len();
        rate_limits.retain(|_, (_, window_started_at)| *window_started_at >= before);
        Ok((initial - rate_limits.len()) as u64)
    }
}

#[async_trait]
impl AuditRepository for InMemoryPlanivoStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.audit_events.write().await.push(event);
        Ok(())
    }
}
