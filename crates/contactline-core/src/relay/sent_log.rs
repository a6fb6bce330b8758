//! Log of bot-sent message IDs, used by retracting reset.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Ordered IDs of messages the bot sent, per conversation.
///
/// Append-only until a reset takes the entries for a chat. Only populated
/// when sent-message tracking is enabled. Clones share state.
#[derive(Clone, Default)]
pub struct SentMessageLog {
    entries: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl SentMessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sent message ID for a conversation.
    pub async fn record(&self, conversation_id: &str, message_id: &str) {
        self.entries
            .write()
            .await
            .entry(conversation_id.to_string())
            .or_default()
            .push(message_id.to_string());
    }

    /// Remove and return all tracked IDs for a conversation, oldest first.
    pub async fn take(&self, conversation_id: &str) -> Vec<String> {
        self.entries
            .write()
            .await
            .remove(conversation_id)
            .unwrap_or_default()
    }

    /// Drop everything.
    pub async fn clear_all(&self) {
        self.entries.write().await.clear();
    }

    pub async fn tracked_count(&self, conversation_id: &str) -> usize {
        self.entries
            .read()
            .await
            .get(conversation_id)
            .map_or(0, Vec::len)
    }
}
