//! Telegram Transport Implementation
//!
//! Implements bidirectional communication with the Telegram Bot API.
//! Receives messages and callback queries via long-polling.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::Stream;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::traits::Transport;
use super::types::{InboundMessage, OutboundMessage, ReplyMarkup, SenderProfile, SentMessage};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org/bot";
/// Default timeout for Telegram API calls (seconds)
const API_TIMEOUT_SECS: u64 = 30;

/// Telegram transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from @BotFather
    pub bot_token: String,
    /// Polling timeout in seconds (default: 30)
    #[serde(default = "default_polling_timeout")]
    pub polling_timeout: u32,
}

fn default_polling_timeout() -> u32 {
    30
}

impl TelegramConfig {
    /// Create a new config with just the bot token
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            polling_timeout: default_polling_timeout(),
        }
    }

    /// Set polling timeout
    pub fn with_polling_timeout(mut self, timeout: u32) -> Self {
        self.polling_timeout = timeout;
        self
    }
}

/// Telegram transport implementation
pub struct TelegramTransport {
    config: TelegramConfig,
    client: Client,
    /// Whether polling is active
    polling_active: Arc<AtomicBool>,
    /// Last update ID for long-polling
    last_update_id: Arc<AtomicI64>,
}

impl TelegramTransport {
    /// Create a new Telegram transport
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            client: Client::new(),
            polling_active: Arc::new(AtomicBool::new(false)),
            last_update_id: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Create with just a bot token
    pub fn with_token(bot_token: impl Into<String>) -> Self {
        Self::new(TelegramConfig::new(bot_token))
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}{}/{}", TELEGRAM_API_BASE, self.config.bot_token, method)
    }

    fn markup_json(markup: &ReplyMarkup) -> serde_json::Value {
        match markup {
            ReplyMarkup::Keyboard(rows) => {
                let keyboard: Vec<Vec<serde_json::Value>> = rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|label| serde_json::json!({ "text": label }))
                            .collect()
                    })
                    .collect();
                serde_json::json!({
                    "keyboard": keyboard,
                    "resize_keyboard": true,
                    "one_time_keyboard": false,
                })
            }
            ReplyMarkup::Inline(rows) => {
                let keyboard: Vec<Vec<serde_json::Value>> = rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|button| {
                                serde_json::json!({
                                    "text": button.text,
                                    "callback_data": button.callback_data,
                                })
                            })
                            .collect()
                    })
                    .collect();
                serde_json::json!({ "inline_keyboard": keyboard })
            }
        }
    }

    /// Send message via Telegram API
    async fn send_message(&self, message: &OutboundMessage) -> Result<TelegramMessageResponse> {
        let url = self.api_url("sendMessage");

        let mut params = serde_json::json!({
            "chat_id": message.conversation_id,
            "text": message.formatted_content(),
        });

        if let Some(mode) = &message.parse_mode {
            params["parse_mode"] = serde_json::Value::String(mode.clone());
        }

        if let Some(markup) = &message.reply_markup {
            params["reply_markup"] = Self::markup_json(markup);
        }

        let response = self
            .client
            .post(&url)
            .json(&params)
            .timeout(std::time::Duration::from_secs(API_TIMEOUT_SECS))
            .send()
            .await?;

        if response.status().is_success() {
            let api_response: TelegramResponse<TelegramMessageResponse> = response.json().await?;
            if api_response.ok {
                api_response
                    .result
                    .ok_or_else(|| anyhow!("Telegram returned ok but no result"))
            } else {
                Err(anyhow!(
                    "Telegram API error: {}",
                    api_response.description.unwrap_or_default()
                ))
            }
        } else {
            let error = response.text().await.unwrap_or_default();
            Err(anyhow!("Telegram HTTP error: {}", error))
        }
    }

    /// Acknowledge a callback query so the client stops showing a spinner
    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        let url = self.api_url("answerCallbackQuery");
        let params = serde_json::json!({ "callback_query_id": callback_query_id });

        let response = self
            .client
            .post(&url)
            .json(&params)
            .timeout(std::time::Duration::from_secs(API_TIMEOUT_SECS))
            .send()
            .await?;

        let body: TelegramResponse<bool> = response.json().await?;
        if body.ok {
            Ok(())
        } else {
            Err(anyhow!(
                "Telegram API error: {}",
                body.description.unwrap_or_default()
            ))
        }
    }

    /// Poll for updates using long-polling
    async fn poll_updates(&self) -> Result<Vec<TelegramUpdate>> {
        let url = self.api_url("getUpdates");

        let offset = self.last_update_id.load(Ordering::SeqCst);
        let params = serde_json::json!({
            "offset": if offset > 0 { offset + 1 } else { 0 },
            "timeout": self.config.polling_timeout,
            "allowed_updates": ["message", "callback_query"],
        });

        let response = self
            .client
            .post(&url)
            .json(&params)
            .timeout(std::time::Duration::from_secs(
                self.config.polling_timeout as u64 + 10,
            ))
            .send()
            .await?;

        let body: TelegramResponse<Vec<TelegramUpdate>> = response.json().await?;

        if !body.ok {
            return Err(anyhow!(
                "Telegram API error: {:?}",
                body.description.unwrap_or_default()
            ));
        }

        let updates = body.result.unwrap_or_default();

        if let Some(last) = updates.last() {
            self.last_update_id.store(last.update_id, Ordering::SeqCst);
        }

        Ok(updates)
    }

    fn profile_from(from: &TelegramUser) -> SenderProfile {
        SenderProfile::new(
            from.first_name.clone(),
            from.last_name.clone(),
            from.username.clone(),
        )
    }

    /// Convert a Telegram update to an InboundMessage
    ///
    /// Returns the message plus the callback query ID to acknowledge, if any.
    fn convert_update(update: TelegramUpdate) -> Option<(InboundMessage, Option<String>)> {
        if let Some(query) = update.callback_query {
            let message = query.message?;
            let inbound = InboundMessage::new(
                format!("cb_{}", query.id),
                query.from.id.to_string(),
                message.chat.id.to_string(),
            )
            .with_callback_data(query.data.unwrap_or_default())
            .with_profile(Self::profile_from(&query.from));
            return Some((inbound, Some(query.id)));
        }

        let message = update.message?;
        let from = message.from?;

        let mut inbound = InboundMessage::new(
            message.message_id.to_string(),
            from.id.to_string(),
            message.chat.id.to_string(),
        )
        .with_profile(Self::profile_from(&from));

        // Media-only messages keep text = None so the engine can prompt
        // for textual input instead of dropping the event.
        if let Some(text) = message.text {
            inbound = inbound.with_text(text);
        }

        if let Some(replied) = message.reply_to_message {
            inbound = inbound.with_reply_to(replied.message_id.to_string());
        }

        Some((inbound, None))
    }

    /// Test the connection by calling getMe
    pub async fn test_connection(&self) -> Result<TelegramUser> {
        let url = self.api_url("getMe");
        let response = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(API_TIMEOUT_SECS))
            .send()
            .await?;

        let body: TelegramResponse<TelegramUser> = response.json().await?;

        if body.ok {
            body.result
                .ok_or_else(|| anyhow!("Telegram returned ok but no result"))
        } else {
            Err(anyhow!(
                "Telegram API error: {}",
                body.description.unwrap_or_default()
            ))
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    fn is_configured(&self) -> bool {
        !self.config.bot_token.is_empty()
    }

    async fn send(&self, message: OutboundMessage) -> Result<SentMessage> {
        let response = self.send_message(&message).await?;
        Ok(SentMessage::new(response.message_id.to_string()))
    }

    async fn delete_message(&self, conversation_id: &str, message_id: &str) -> Result<()> {
        let url = self.api_url("deleteMessage");
        let params = serde_json::json!({
            "chat_id": conversation_id,
            "message_id": message_id.parse::<i64>()?,
        });

        let response = self
            .client
            .post(&url)
            .json(&params)
            .timeout(std::time::Duration::from_secs(API_TIMEOUT_SECS))
            .send()
            .await?;

        let body: TelegramResponse<bool> = response.json().await?;
        if body.ok {
            Ok(())
        } else {
            Err(anyhow!(
                "Telegram API error: {}",
                body.description.unwrap_or_default()
            ))
        }
    }

    async fn send_typing(&self, conversation_id: &str) -> Result<()> {
        let url = self.api_url("sendChatAction");

        let params = serde_json::json!({
            "chat_id": conversation_id,
            "action": "typing",
        });

        let response = self
            .client
            .post(&url)
            .json(&params)
            .timeout(std::time::Duration::from_secs(API_TIMEOUT_SECS))
            .send()
            .await?;

        let body: TelegramResponse<bool> = response.json().await?;
        if body.ok {
            debug!("Sent typing indicator to {}", conversation_id);
            Ok(())
        } else {
            Err(anyhow!(
                "Telegram API error: {}",
                body.description.unwrap_or_default()
            ))
        }
    }

    fn start_receiving(&self) -> Option<Pin<Box<dyn Stream<Item = InboundMessage> + Send>>> {
        if !self.is_configured() {
            return None;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let polling_active = self.polling_active.clone();
        let last_update_id = self.last_update_id.clone();
        let config = self.config.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            polling_active.store(true, Ordering::SeqCst);
            info!("Starting Telegram polling");

            let transport = TelegramTransport {
                config,
                client,
                polling_active: polling_active.clone(),
                last_update_id,
            };

            while polling_active.load(Ordering::SeqCst) {
                match transport.poll_updates().await {
                    Ok(updates) => {
                        for update in updates {
                            let Some((message, callback_id)) =
                                TelegramTransport::convert_update(update)
                            else {
                                continue;
                            };

                            // Acknowledge button presses here so handlers
                            // never leave a spinner hanging client-side.
                            if let Some(callback_id) = callback_id
                                && let Err(e) =
                                    transport.answer_callback_query(&callback_id).await
                            {
                                warn!("Failed to answer callback query: {}", e);
                            }

                            debug!(
                                "Received Telegram message {} from {}",
                                message.id, message.sender_id
                            );
                            if tx.send(message).is_err() {
                                warn!("Message receiver dropped, stopping polling");
                                polling_active.store(false, Ordering::SeqCst);
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        error!("Telegram polling error: {}", e);
                        // Back off on error
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                }
            }

            info!("Telegram polling stopped");
        });

        Some(Box::pin(
            tokio_stream::wrappers::UnboundedReceiverStream::new(rx),
        ))
    }
}

// ============================================================================
// Telegram API Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    update_id: i64,
    message: Option<TelegramMessage>,
    callback_query: Option<TelegramCallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    message_id: i64,
    from: Option<TelegramUser>,
    chat: TelegramChat,
    text: Option<String>,
    reply_to_message: Option<Box<TelegramMessage>>,
}

#[derive(Debug, Deserialize)]
struct TelegramCallbackQuery {
    id: String,
    from: TelegramUser,
    message: Option<TelegramMessage>,
    data: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TelegramMessageResponse {
    message_id: i64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::types::InlineButton;

    fn user(id: i64) -> TelegramUser {
        TelegramUser {
            id,
            is_bot: false,
            first_name: Some("John".to_string()),
            last_name: Some("Doe".to_string()),
            username: Some("johndoe".to_string()),
        }
    }

    fn text_message(message_id: i64, chat_id: i64, text: Option<&str>) -> TelegramMessage {
        TelegramMessage {
            message_id,
            from: Some(user(42)),
            chat: TelegramChat { id: chat_id },
            text: text.map(str::to_string),
            reply_to_message: None,
        }
    }

    #[test]
    fn test_telegram_config_builder() {
        let config = TelegramConfig::new("test-token").with_polling_timeout(60);
        assert_eq!(config.bot_token, "test-token");
        assert_eq!(config.polling_timeout, 60);
    }

    #[test]
    fn test_telegram_transport_is_configured() {
        let transport = TelegramTransport::with_token("test-token");
        assert!(transport.is_configured());

        let empty = TelegramTransport::with_token("");
        assert!(!empty.is_configured());
    }

    #[test]
    fn test_api_url() {
        let transport = TelegramTransport::with_token("123:ABC");
        assert_eq!(
            transport.api_url("sendMessage"),
            "https://api.telegram.org/bot123:ABC/sendMessage"
        );
    }

    #[test]
    fn test_convert_update_text() {
        let update = TelegramUpdate {
            update_id: 12345,
            message: Some(text_message(100, 999, Some("Hello world"))),
            callback_query: None,
        };

        let (inbound, callback_id) = TelegramTransport::convert_update(update).unwrap();
        assert!(callback_id.is_none());
        assert_eq!(inbound.id, "100");
        assert_eq!(inbound.sender_id, "42");
        assert_eq!(inbound.conversation_id, "999");
        assert_eq!(inbound.text.as_deref(), Some("Hello world"));
        assert_eq!(inbound.profile.first_name.as_deref(), Some("John"));
    }

    #[test]
    fn test_convert_update_media_keeps_event_without_text() {
        let update = TelegramUpdate {
            update_id: 12345,
            message: Some(text_message(101, 999, None)),
            callback_query: None,
        };

        let (inbound, _) = TelegramTransport::convert_update(update).unwrap();
        assert!(inbound.text.is_none());
        assert_eq!(inbound.id, "101");
    }

    #[test]
    fn test_convert_update_reply() {
        let mut message = text_message(102, 999, Some("try restarting"));
        message.reply_to_message = Some(Box::new(text_message(88, 999, Some("card"))));

        let update = TelegramUpdate {
            update_id: 12345,
            message: Some(message),
            callback_query: None,
        };

        let (inbound, _) = TelegramTransport::convert_update(update).unwrap();
        assert_eq!(inbound.reply_to.as_deref(), Some("88"));
    }

    #[test]
    fn test_convert_update_callback_query() {
        let update = TelegramUpdate {
            update_id: 12345,
            message: None,
            callback_query: Some(TelegramCallbackQuery {
                id: "cbq-7".to_string(),
                from: user(42),
                message: Some(text_message(55, 999, Some("choose a category"))),
                data: Some("category:bug".to_string()),
            }),
        };

        let (inbound, callback_id) = TelegramTransport::convert_update(update).unwrap();
        assert_eq!(callback_id.as_deref(), Some("cbq-7"));
        assert_eq!(inbound.conversation_id, "999");
        assert_eq!(inbound.callback_data.as_deref(), Some("category:bug"));
        assert!(inbound.text.is_none());
    }

    #[test]
    fn test_convert_update_no_message() {
        let update = TelegramUpdate {
            update_id: 12345,
            message: None,
            callback_query: None,
        };
        assert!(TelegramTransport::convert_update(update).is_none());
    }

    #[test]
    fn test_markup_json_keyboard() {
        let markup = ReplyMarkup::Keyboard(vec![vec![
            "📨 Contact admin".to_string(),
            "ℹ️ About this bot".to_string(),
        ]]);
        let json = TelegramTransport::markup_json(&markup);
        assert_eq!(json["keyboard"][0][0]["text"], "📨 Contact admin");
        assert_eq!(json["resize_keyboard"], true);
    }

    #[test]
    fn test_markup_json_inline() {
        let markup = ReplyMarkup::Inline(vec![vec![InlineButton::new("🐞 Bug", "category:bug")]]);
        let json = TelegramTransport::markup_json(&markup);
        assert_eq!(json["inline_keyboard"][0][0]["callback_data"], "category:bug");
    }
}
