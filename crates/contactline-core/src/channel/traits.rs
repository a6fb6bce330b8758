//! Transport Trait Definition
//!
//! Defines the interface the relay engine uses to talk to the messaging
//! transport, plus a capture mock for tests.

use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use super::types::{InboundMessage, OutboundMessage, SentMessage};

/// Messaging transport used by the relay engine
///
/// Implementations send messages, optionally delete them, and yield inbound
/// events as a stream.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Check if the transport is properly configured
    fn is_configured(&self) -> bool;

    /// Send a message, returning the transport-assigned message ID
    async fn send(&self, message: OutboundMessage) -> Result<SentMessage>;

    /// Send a simple text message
    async fn send_text(&self, conversation_id: &str, text: &str) -> Result<SentMessage> {
        self.send(OutboundMessage::new(conversation_id, text)).await
    }

    /// Delete a previously sent message (best-effort; may fail for old messages)
    async fn delete_message(&self, conversation_id: &str, message_id: &str) -> Result<()>;

    /// Send a typing indicator
    async fn send_typing(&self, conversation_id: &str) -> Result<()> {
        let _ = conversation_id;
        Ok(())
    }

    /// Start receiving messages (returns None if the transport cannot receive)
    ///
    /// The returned stream should be consumed from a single task; messages are
    /// yielded as they arrive from the transport.
    fn start_receiving(&self) -> Option<Pin<Box<dyn Stream<Item = InboundMessage> + Send>>>;
}

/// Test/mock transport for unit testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::sync::Mutex;

    /// A mock transport that captures outbound traffic and assigns
    /// sequential message IDs ("1", "2", ...).
    pub struct MockTransport {
        sent: Mutex<Vec<(OutboundMessage, String)>>,
        deleted: Mutex<Vec<(String, String)>>,
        failing_conversations: Mutex<HashSet<String>>,
        next_id: AtomicU64,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                deleted: Mutex::new(Vec::new()),
                failing_conversations: Mutex::new(HashSet::new()),
                next_id: AtomicU64::new(1),
            }
        }

        /// Make every send to `conversation_id` fail
        pub async fn fail_conversation(&self, conversation_id: &str) {
            self.failing_conversations
                .lock()
                .await
                .insert(conversation_id.to_string());
        }

        /// All sent messages with their assigned IDs, in order
        pub async fn sent_messages(&self) -> Vec<(OutboundMessage, String)> {
            self.sent.lock().await.clone()
        }

        /// Sent messages addressed to one conversation
        pub async fn sent_to(&self, conversation_id: &str) -> Vec<(OutboundMessage, String)> {
            self.sent
                .lock()
                .await
                .iter()
                .filter(|(m, _)| m.conversation_id == conversation_id)
                .cloned()
                .collect()
        }

        /// All (conversation_id, message_id) deletions, in order
        pub async fn deleted_messages(&self) -> Vec<(String, String)> {
            self.deleted.lock().await.clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        fn is_configured(&self) -> bool {
            true
        }

        async fn send(&self, message: OutboundMessage) -> Result<SentMessage> {
            if self
                .failing_conversations
                .lock()
                .await
                .contains(&message.conversation_id)
            {
                return Err(anyhow!("send rejected for {}", message.conversation_id));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
            self.sent.lock().await.push((message, id.clone()));
            Ok(SentMessage::new(id))
        }

        async fn delete_message(&self, conversation_id: &str, message_id: &str) -> Result<()> {
            self.deleted
                .lock()
                .await
                .push((conversation_id.to_string(), message_id.to_string()));
            Ok(())
        }

        fn start_receiving(&self) -> Option<Pin<Box<dyn Stream<Item = InboundMessage> + Send>>> {
            None
        }
    }
}
