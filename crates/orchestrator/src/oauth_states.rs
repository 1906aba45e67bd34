//! Single-use correlation state for OAuth handshakes.
//!
//! A connect request mints a random token and parks the pending user here;
//! the provider echoes the token back as `state` on the callback. Entries
//! are consumed on first use and expire after a fixed window.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

/// How long a handshake may stay pending before its token is rejected.
pub const HANDSHAKE_TTL: Duration = Duration::from_secs(10 * 60);

/// A pending OAuth handshake awaiting its callback.
#[derive(Debug, Clone)]
pub struct PendingHandshake {
    /// Resolved user row id.
    pub user_id: i64,
    /// Integration being connected (e.g. `github`).
    pub integration_type: String,
}

/// Concurrency-safe store of pending handshakes with TTL.
pub struct HandshakeStore {
    states: RwLock<HashMap<String, (PendingHandshake, Instant)>>,
    ttl: Duration,
}

impl Default for HandshakeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HandshakeStore {
    /// Create a store with the default 10-minute TTL.
    pub fn new() -> Self {
        Self::with_ttl(HANDSHAKE_TTL)
    }

    /// Create a store with a custom TTL (used by tests).
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Park a pending handshake under its correlation token.
    pub async fn insert(&self, token: impl Into<String>, pending: PendingHandshake) {
        self.states
            .write()
            .await
            .insert(token.into(), (pending, Instant::now()));
    }

    /// Consume a handshake. The entry is removed whether or not it is still
    /// valid; a second take of the same token always fails.
    pub async fn take(&self, token: &str) -> Option<PendingHandshake> {
        let (pending, issued_at) = self.states.write().await.remove(token)?;

        if issued_at.elapsed() > self.ttl {
            debug!("Rejecting expired OAuth state");
            return None;
        }

        Some(pending)
    }

    /// Drop entries past their TTL. Returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let mut states = self.states.write().await;
        let before = states.len();
        states.retain(|_, (_, issued_at)| issued_at.elapsed() <= self.ttl);
        before - states.len()
    }

    /// Number of pending handshakes (including any not yet swept).
    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.states.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> PendingHandshake {
        PendingHandshake {
            user_id: 1,
            integration_type: "github".to_string(),
        }
    }

    #[tokio::test]
    async fn test_take_is_single_use() {
        let store = HandshakeStore::new();
        store.insert("tok", pending()).await;

        let first = store.take("tok").await;
        assert_eq!(first.unwrap().user_id, 1);

        // Second use of the same token is invalid state.
        assert!(store.take("tok").await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_token_rejected() {
        let store = HandshakeStore::new();
        assert!(store.take("never-issued").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_token_rejected_and_removed() {
        let store = HandshakeStore::with_ttl(Duration::from_millis(0));
        store.insert("tok", pending()).await;

        assert!(store.take("tok").await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let store = HandshakeStore::with_ttl(Duration::from_millis(0));
        store.insert("stale", pending()).await;
        let removed = store.sweep_expired().await;

        assert_eq!(removed, 1);
        assert!(store.is_empty().await);
    }
}
