//! Relay engine: drives the contact flow and the operator reply channel.
//!
//! One engine instance owns the transport plus the three shared stores and
//! processes inbound events one at a time. Errors from a single event are
//! logged and never tear down the receive loop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use crate::channel::{InboundMessage, OutboundMessage, SentMessage, Transport};

use super::commands::{
    about_text, ack_text, admin_reply, cancel_text, category_keyboard, category_prompt_text,
    contact_prompt_text, main_keyboard, message_prompt_after_category, message_prompt_text,
    no_linked_user_text, operator_help_text, operator_hint_text, reply_delivered_text,
    reply_failed_text, text_replies_only_text, text_required_text, welcome_text,
};
use super::package::{Category, RelayPackage};
use super::registry::ReplyAddressRegistry;
use super::reset::ResetController;
use super::router::{classify, OperatorAction, RouteDecision, UserAction};
use super::sent_log::SentMessageLog;
use super::session::{SessionStore, Step};

/// Literal a user sends to leave contact info out. Matched case-insensitively.
const SKIP_LITERAL: &str = "skip";

/// Delay before re-opening the inbound stream after it ends or fails to open.
#[cfg(not(test))]
const STREAM_RECONNECT_DELAY: Duration = Duration::from_secs(2);
#[cfg(test)]
const STREAM_RECONNECT_DELAY: Duration = Duration::from_millis(20);

/// Feature switches for the relay flow.
///
/// The three flags compose freely; all eight combinations are valid. With
/// both collection flags off, pressing "Contact admin" drops the user
/// straight into message entry and the package ships on the next text.
#[derive(Debug, Clone, Copy)]
pub struct RelayFlags {
    /// Ask the user to pick a category before writing their message.
    pub collect_category: bool,
    /// Ask for an optional way to reach the user after the message.
    pub collect_contact_info: bool,
    /// Remember every bot message ID so reset can retract them.
    pub track_sent_messages: bool,
}

impl Default for RelayFlags {
    fn default() -> Self {
        Self {
            collect_category: true,
            collect_contact_info: true,
            track_sent_messages: false,
        }
    }
}

pub struct RelayEngine {
    transport: Arc<dyn Transport>,
    operator_conversation: String,
    flags: RelayFlags,
    sessions: SessionStore,
    registry: ReplyAddressRegistry,
    sent_log: SentMessageLog,
    reset: ResetController,
}

impl RelayEngine {
    pub fn new(
        transport: Arc<dyn Transport>,
        operator_conversation: impl Into<String>,
        flags: RelayFlags,
        sessions: SessionStore,
        registry: ReplyAddressRegistry,
        sent_log: SentMessageLog,
    ) -> Self {
        let reset = ResetController::new(
            transport.clone(),
            sessions.clone(),
            registry.clone(),
            sent_log.clone(),
            flags.track_sent_messages,
        );
        Self {
            transport,
            operator_conversation: operator_conversation.into(),
            flags,
            sessions,
            registry,
            sent_log,
            reset,
        }
    }

    /// Receive loop. Opens the transport's inbound stream and processes
    /// events until the stream ends, then reconnects after a short delay.
    pub async fn run(&self) {
        info!("Relay engine started");
        loop {
            let Some(mut stream) = self.transport.start_receiving() else {
                warn!("Transport has no inbound stream; retrying");
                tokio::time::sleep(STREAM_RECONNECT_DELAY).await;
                continue;
            };

            while let Some(message) = stream.next().await {
                if let Err(e) = self.handle_inbound(message).await {
                    error!("Error handling inbound message: {}", e);
                }
            }

            warn!("Inbound stream ended; reconnecting");
            tokio::time::sleep(STREAM_RECONNECT_DELAY).await;
        }
    }

    /// Process one inbound event.
    pub async fn handle_inbound(&self, message: InboundMessage) -> Result<()> {
        debug!(
            "Inbound {} from conversation {}",
            message.id, message.conversation_id
        );
        match classify(&message, &self.operator_conversation) {
            RouteDecision::Operator(action) => self.handle_operator(message, action).await,
            RouteDecision::User(action) => self.handle_user(message, action).await,
        }
    }

    async fn handle_user(&self, message: InboundMessage, action: UserAction) -> Result<()> {
        let conversation = message.conversation_id.clone();
        match action {
            UserAction::Welcome => {
                self.send(
                    OutboundMessage::new(&conversation, welcome_text())
                        .with_reply_markup(main_keyboard()),
                )
                .await?;
            }
            UserAction::About => {
                self.send(OutboundMessage::new(&conversation, about_text()))
                    .await?;
            }
            UserAction::Cancel => {
                self.sessions.clear(&conversation).await;
                self.send(OutboundMessage::new(&conversation, cancel_text()))
                    .await?;
            }
            UserAction::Reset => {
                self.reset.reset_user(&conversation).await?;
            }
            UserAction::StartContact => {
                if self.flags.collect_category {
                    self.sessions.start(&conversation, Step::ChoosingCategory).await;
                    self.send(
                        OutboundMessage::new(&conversation, category_prompt_text())
                            .with_reply_markup(category_keyboard()),
                    )
                    .await?;
                } else {
                    self.sessions.start(&conversation, Step::AwaitingMessage).await;
                    self.send(OutboundMessage::new(&conversation, message_prompt_text()))
                        .await?;
                }
            }
            UserAction::CategorySelection { payload } => {
                self.handle_category_selection(&message, &payload).await?;
            }
            UserAction::Input => {
                self.handle_user_input(&message).await?;
            }
        }
        Ok(())
    }

    async fn handle_category_selection(
        &self,
        message: &InboundMessage,
        payload: &str,
    ) -> Result<()> {
        let Some(category) = Category::parse_callback(payload) else {
            debug!("Ignoring unknown callback payload: {}", payload);
            return Ok(());
        };

        let conversation = &message.conversation_id;
        // A selection is honored even if the prompt is stale and no session
        // remains; the flow simply resumes at message entry.
        self.sessions.start(conversation, Step::AwaitingMessage).await;
        self.sessions
            .update(conversation, |session| session.category = Some(category))
            .await;

        self.send(OutboundMessage::new(
            conversation,
            message_prompt_after_category(category),
        ))
        .await?;
        Ok(())
    }

    async fn handle_user_input(&self, message: &InboundMessage) -> Result<()> {
        let conversation = &message.conversation_id;
        let Some(session) = self.sessions.get(conversation).await else {
            // No flow in progress: relay the input as a one-shot package.
            let package = RelayPackage::one_shot(
                &message.profile,
                conversation.clone(),
                message.trimmed_text().map(str::to_string),
            );
            return self.forward_package(package).await;
        };

        match session.step {
            Step::ChoosingCategory => {
                // Typed text while a category prompt is pending; nudge back
                // to the buttons without losing the flow.
                self.send(
                    OutboundMessage::new(conversation, category_prompt_text())
                        .with_reply_markup(category_keyboard()),
                )
                .await?;
            }
            Step::AwaitingMessage => {
                let Some(text) = message.trimmed_text() else {
                    self.send(OutboundMessage::warning(conversation, text_required_text()))
                        .await?;
                    return Ok(());
                };
                let text = text.to_string();
                if self.flags.collect_contact_info {
                    self.sessions
                        .update(conversation, |session| {
                            session.pending_message = Some(text.clone());
                            session.step = Step::AwaitingContactInfo;
                        })
                        .await;
                    self.send(OutboundMessage::new(conversation, contact_prompt_text()))
                        .await?;
                } else {
                    let package = RelayPackage::new(
                        &message.profile,
                        conversation.clone(),
                        self.category_label(&session.category),
                        Some(text),
                        None,
                    );
                    self.sessions.clear(conversation).await;
                    self.forward_package(package).await?;
                }
            }
            Step::AwaitingContactInfo => {
                let Some(text) = message.trimmed_text() else {
                    self.send(OutboundMessage::warning(conversation, text_required_text()))
                        .await?;
                    return Ok(());
                };
                let contact_info = if text.eq_ignore_ascii_case(SKIP_LITERAL) {
                    None
                } else {
                    Some(text.to_string())
                };
                let package = RelayPackage::new(
                    &message.profile,
                    conversation.clone(),
                    self.category_label(&session.category),
                    session.pending_message.clone(),
                    contact_info,
                );
                self.sessions.clear(conversation).await;
                self.forward_package(package).await?;
            }
        }
        Ok(())
    }

    fn category_label(&self, category: &Option<Category>) -> String {
        category
            .map(|c| c.label().to_string())
            .unwrap_or_else(|| Category::General.label().to_string())
    }

    /// Deliver one package: card to the operator, acknowledgment to the
    /// sender. The two sends are independent; a failure of one never
    /// suppresses the other.
    async fn forward_package(&self, package: RelayPackage) -> Result<()> {
        if let Err(e) = self.transport.send_typing(&self.operator_conversation).await {
            debug!("Typing indicator failed: {}", e);
        }

        let card = OutboundMessage::new(&self.operator_conversation, package.format_card());
        match self.send(card).await {
            Ok(sent) => {
                self.registry
                    .record(&sent.message_id, &package.sender_conversation)
                    .await;
                info!(
                    "Relayed package from {} as message {}",
                    package.sender_conversation, sent.message_id
                );
            }
            Err(e) => {
                error!("Failed to deliver contact card to operator: {}", e);
            }
        }

        let ack = OutboundMessage::success(&package.sender_conversation, ack_text());
        if let Err(e) = self.send(ack).await {
            error!(
                "Failed to acknowledge sender {}: {}",
                package.sender_conversation, e
            );
        }
        Ok(())
    }

    async fn handle_operator(&self, message: InboundMessage, action: OperatorAction) -> Result<()> {
        match action {
            OperatorAction::Help => {
                self.send(OutboundMessage::new(
                    &self.operator_conversation,
                    operator_help_text(),
                ))
                .await?;
            }
            OperatorAction::Reset => {
                self.reset.reset_operator(&self.operator_conversation).await?;
            }
            OperatorAction::Hint => {
                self.send(OutboundMessage::new(
                    &self.operator_conversation,
                    operator_hint_text(),
                ))
                .await?;
            }
            OperatorAction::Reply { reply_to } => {
                self.handle_operator_reply(&message, &reply_to).await?;
            }
        }
        Ok(())
    }

    async fn handle_operator_reply(
        &self,
        message: &InboundMessage,
        reply_to: &str,
    ) -> Result<()> {
        let Some(target) = self.registry.lookup(reply_to).await else {
            warn!("Operator replied to unmapped message {}", reply_to);
            self.send(OutboundMessage::warning(
                &self.operator_conversation,
                no_linked_user_text(),
            ))
            .await?;
            return Ok(());
        };

        let Some(text) = message.trimmed_text() else {
            self.send(OutboundMessage::warning(
                &self.operator_conversation,
                text_replies_only_text(),
            ))
            .await?;
            return Ok(());
        };

        match self
            .send(OutboundMessage::new(&target, admin_reply(text)))
            .await
        {
            Ok(_) => {
                info!("Operator reply delivered to {}", target);
                self.send(OutboundMessage::success(
                    &self.operator_conversation,
                    reply_delivered_text(),
                ))
                .await?;
            }
            Err(e) => {
                error!("Operator reply to {} failed: {}", target, e);
                self.send(OutboundMessage::error(
                    &self.operator_conversation,
                    reply_failed_text(),
                ))
                .await?;
            }
        }
        Ok(())
    }

    /// Transport send that also feeds the retraction log when enabled.
    async fn send(&self, message: OutboundMessage) -> Result<SentMessage> {
        let conversation = message.conversation_id.clone();
        let sent = self.transport.send(message).await?;
        if self.flags.track_sent_messages {
            self.sent_log.record(&conversation, &sent.message_id).await;
        }
        Ok(sent)
    }
}
