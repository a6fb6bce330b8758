//! Reply-address registry for reverse routing.
//!
//! Maps each relayed message's transport-assigned ID to the conversation it
//! originated from, so an operator reply to that message can be routed back
//! to the right user. Entries are capped; the oldest mapping is evicted when
//! the registry is full.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Upper bound on retained reply addresses.
const DEFAULT_CAPACITY: usize = 1024;

#[derive(Default)]
struct Inner {
    entries: HashMap<String, String>,
    /// Insertion order for eviction.
    order: VecDeque<String>,
}

/// Maps relay message ID -> originating conversation ID.
///
/// Last write wins per key. Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct ReplyAddressRegistry {
    inner: Arc<RwLock<Inner>>,
    capacity: usize,
}

impl Default for ReplyAddressRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyAddressRegistry {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            capacity: capacity.max(1),
        }
    }

    /// Record a mapping from a relayed message to its originating user.
    pub async fn record(&self, relay_message_id: &str, user_conversation: &str) {
        let mut inner = self.inner.write().await;

        if inner
            .entries
            .insert(relay_message_id.to_string(), user_conversation.to_string())
            .is_none()
        {
            inner.order.push_back(relay_message_id.to_string());
        }

        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
                debug!("Evicted reply address for message {}", oldest);
            }
        }
    }

    /// Look up the originating conversation for a relayed message.
    pub async fn lookup(&self, relay_message_id: &str) -> Option<String> {
        self.inner.read().await.entries.get(relay_message_id).cloned()
    }

    /// Drop every mapping pointing at one user's conversation.
    pub async fn remove_user(&self, user_conversation: &str) {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        inner
            .entries
            .retain(|_, target| target != user_conversation);
        let entries = &inner.entries;
        inner.order.retain(|id| entries.contains_key(id));
    }

    /// Drop all mappings.
    pub async fn clear_all(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.order.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_and_lookup() {
        let registry = ReplyAddressRegistry::new();
        registry.record("100", "chat-1").await;

        assert_eq!(registry.lookup("100").await.as_deref(), Some("chat-1"));
        assert!(registry.lookup("999").await.is_none());
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let registry = ReplyAddressRegistry::new();
        registry.record("100", "chat-1").await;
        registry.record("100", "chat-2").await;

        assert_eq!(registry.lookup("100").await.as_deref(), Some("chat-2"));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_eviction_drops_oldest() {
        let registry = ReplyAddressRegistry::with_capacity(2);
        registry.record("1", "chat-a").await;
        registry.record("2", "chat-b").await;
        registry.record("3", "chat-c").await;

        assert!(registry.lookup("1").await.is_none());
        assert_eq!(registry.lookup("2").await.as_deref(), Some("chat-b"));
        assert_eq!(registry.lookup("3").await.as_deref(), Some("chat-c"));
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_remove_user_only_touches_that_user() {
        let registry = ReplyAddressRegistry::new();
        registry.record("1", "chat-a").await;
        registry.record("2", "chat-b").await;
        registry.record("3", "chat-a").await;

        registry.remove_user("chat-a").await;

        assert!(registry.lookup("1").await.is_none());
        assert!(registry.lookup("3").await.is_none());
        assert_eq!(registry.lookup("2").await.as_deref(), Some("chat-b"));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_clear_all() {
        let registry = ReplyAddressRegistry::new();
        registry.record("1", "chat-a").await;
        registry.clear_all().await;

        assert!(registry.is_empty().await);
        // Clearing an empty registry is fine.
        registry.clear_all().await;
    }
}
