//! Reset controller: best-effort cleanup of per-chat relay state.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::channel::{OutboundMessage, Transport};

use super::commands::{main_keyboard, reset_done_text, welcome_text};
use super::registry::ReplyAddressRegistry;
use super::sent_log::SentMessageLog;
use super::session::SessionStore;

/// Clears session and routing state for a chat, optionally retracting
/// previously sent bot messages.
///
/// Both reset flavors are idempotent: resetting an already-clean chat only
/// emits the confirmation message.
#[derive(Clone)]
pub struct ResetController {
    transport: Arc<dyn Transport>,
    sessions: SessionStore,
    registry: ReplyAddressRegistry,
    sent_log: SentMessageLog,
    /// Whether reset also deletes tracked bot messages (retracting reset).
    retract: bool,
}

impl ResetController {
    pub fn new(
        transport: Arc<dyn Transport>,
        sessions: SessionStore,
        registry: ReplyAddressRegistry,
        sent_log: SentMessageLog,
        retract: bool,
    ) -> Self {
        Self {
            transport,
            sessions,
            registry,
            sent_log,
            retract,
        }
    }

    /// Reset one user's chat: clear their session and registry entries,
    /// retract tracked messages when enabled, then confirm.
    pub async fn reset_user(&self, conversation_id: &str) -> Result<()> {
        self.sessions.clear(conversation_id).await;
        self.registry.remove_user(conversation_id).await;

        if self.retract {
            let tracked = self.sent_log.take(conversation_id).await;
            info!(
                "Retracting {} tracked message(s) in {}",
                tracked.len(),
                conversation_id
            );
            for message_id in tracked {
                // Deletion can fail for messages that are too old; that is
                // fine, retraction is best-effort.
                if let Err(e) = self
                    .transport
                    .delete_message(conversation_id, &message_id)
                    .await
                {
                    debug!("Could not delete message {}: {}", message_id, e);
                }
            }
        }

        self.send_tracked(OutboundMessage::new(conversation_id, reset_done_text()))
            .await?;

        if self.retract {
            let welcome = OutboundMessage::new(conversation_id, welcome_text())
                .with_reply_markup(main_keyboard());
            self.send_tracked(welcome).await?;
        }

        Ok(())
    }

    /// Operator-invoked reset: clears the entire reply-address registry.
    pub async fn reset_operator(&self, operator_conversation: &str) -> Result<()> {
        let cleared = self.registry.len().await;
        self.registry.clear_all().await;
        info!("Operator reset cleared {} reply address(es)", cleared);

        self.send_tracked(OutboundMessage::new(
            operator_conversation,
            reset_done_text(),
        ))
        .await?;
        Ok(())
    }

    /// Send and, when retraction is enabled, remember the message ID so a
    /// later reset can delete it too.
    async fn send_tracked(&self, message: OutboundMessage) -> Result<()> {
        let conversation = message.conversation_id.clone();
        match self.transport.send(message).await {
            Ok(sent) => {
                if self.retract {
                    self.sent_log.record(&conversation, &sent.message_id).await;
                }
                Ok(())
            }
            Err(e) => {
                warn!("Failed to send reset notice to {}: {}", conversation, e);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::mock::MockTransport;
    use crate::relay::session::Step;

    fn controller(retract: bool) -> (Arc<MockTransport>, ResetController) {
        let transport = Arc::new(MockTransport::new());
        let controller = ResetController::new(
            transport.clone(),
            SessionStore::new(),
            ReplyAddressRegistry::new(),
            SentMessageLog::new(),
            retract,
        );
        (transport, controller)
    }

    #[tokio::test]
    async fn test_reset_clean_chat_is_confirmation_only() {
        let (transport, controller) = controller(false);

        controller.reset_user("chat-1").await.unwrap();

        let sent = transport.sent_to("chat-1").await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.content, reset_done_text());
        assert!(transport.deleted_messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_soft_reset_clears_session_and_registry_entries() {
        let (_, controller) = controller(false);
        controller.sessions.start("chat-1", Step::AwaitingMessage).await;
        controller.registry.record("10", "chat-1").await;
        controller.registry.record("11", "chat-2").await;

        controller.reset_user("chat-1").await.unwrap();

        assert!(controller.sessions.get("chat-1").await.is_none());
        assert!(controller.registry.lookup("10").await.is_none());
        assert_eq!(
            controller.registry.lookup("11").await.as_deref(),
            Some("chat-2")
        );
    }

    #[tokio::test]
    async fn test_retracting_reset_deletes_tracked_messages_and_rewelcomes() {
        let (transport, controller) = controller(true);
        controller.sent_log.record("chat-1", "5").await;
        controller.sent_log.record("chat-1", "6").await;

        controller.reset_user("chat-1").await.unwrap();

        let deleted = transport.deleted_messages().await;
        assert_eq!(
            deleted,
            vec![
                ("chat-1".to_string(), "5".to_string()),
                ("chat-1".to_string(), "6".to_string()),
            ]
        );

        let sent = transport.sent_to("chat-1").await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0.content, reset_done_text());
        assert_eq!(sent[1].0.content, welcome_text());
        assert!(sent[1].0.reply_markup.is_some());

        // The new messages are tracked for the next reset.
        assert_eq!(controller.sent_log.tracked_count("chat-1").await, 2);
    }

    #[tokio::test]
    async fn test_operator_reset_clears_whole_registry() {
        let (transport, controller) = controller(false);
        controller.registry.record("10", "chat-1").await;
        controller.registry.record("11", "chat-2").await;

        controller.reset_operator("op-chat").await.unwrap();

        assert!(controller.registry.is_empty().await);
        assert_eq!(transport.sent_to("op-chat").await.len(), 1);
    }

    #[tokio::test]
    async fn test_reset_survives_send_failure() {
        let (transport, controller) = controller(false);
        transport.fail_conversation("chat-1").await;
        controller.sessions.start("chat-1", Step::AwaitingMessage).await;

        controller.reset_user("chat-1").await.unwrap();
        assert!(controller.sessions.get("chat-1").await.is_none());
    }
}
