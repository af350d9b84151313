use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::Session;

/// Server-side session keeping, keyed by the SHA-256 of the bearer token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the session only while it has not expired at `now`.
    async fn load(&self, token_hash: &str, now: DateTime<Utc>) -> Option<Session>;
    async fn save(&self, session: Session);
    /// Returns whether a session was removed.
    async fn clear(&self, token_hash: &str) -> bool;
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, token_hash: &str, now: DateTime<Utc>) -> Option<Session> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(token_hash) {
                None => return None,
                Some(s) if s.expires_at > now => return Some(s.clone()),
                Some(_) => {}
            }
        }

        // Expired: drop it, unless it was replaced while the lock was released.
        let mut sessions = self.sessions.write().await;
        if sessions.get(token_hash).is_some_and(|s| s.expires_at <= now) {
            sessions.remove(token_hash);
            tracing::debug!("evicted expired session");
        }
        None
    }

    async fn save(&self, session: Session) {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.expires_at > session.created_at);
        sessions.insert(session.token_hash.clone(), session);
    }

    async fn clear(&self, token_hash: &str) -> bool {
        self.sessions.write().await.remove(token_hash).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn session(token_hash: &str, expires_at: DateTime<Utc>) -> Session {
        Session {
            session_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: token_hash.to_string(),
            created_at: expires_at - Duration::hours(24),
            expires_at,
        }
    }

    #[tokio::test]
    async fn expired_sessions_do_not_load() {
        let store = MemorySessionStore::default();
        let expires = Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap();
        store.save(session("abc", expires)).await;

        assert!(store.load("abc", expires - Duration::seconds(1)).await.is_some());
        assert!(store.load("abc", expires).await.is_none());
        assert!(store.load("missing", expires - Duration::hours(1)).await.is_none());
    }

    #[tokio::test]
    async fn loading_an_expired_session_evicts_it() {
        let store = MemorySessionStore::default();
        let expires = Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap();
        store.save(session("abc", expires)).await;

        assert!(store.load("abc", expires + Duration::minutes(5)).await.is_none());
        assert!(!store.sessions.read().await.contains_key("abc"));
    }

    #[tokio::test]
    async fn saving_sweeps_sessions_expired_by_then() {
        let store = MemorySessionStore::default();
        let day_one = Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap();
        for i in 0..50 {
            store.save(session(&format!("old-{i}"), day_one)).await;
        }
        assert_eq!(store.sessions.read().await.len(), 50);

        let later = session("fresh", day_one + Duration::days(2));
        store.save(later).await;

        let sessions = store.sessions.read().await;
        assert_eq!(sessions.len(), 1);
        assert!(sessions.contains_key("fresh"));
    }

    #[tokio::test]
    async fn clear_removes_once() {
        let store = MemorySessionStore::default();
        let expires = Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap();
        store.save(session("abc", expires)).await;

        assert!(store.clear("abc").await);
        assert!(!store.clear("abc").await);
        assert!(store.load("abc", expires - Duration::hours(1)).await.is_none());
    }
}
