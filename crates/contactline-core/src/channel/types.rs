//! Channel Message Types
//!
//! Core types for the transport-facing message layer.

use serde::{Deserialize, Serialize};

/// Message level for formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLevel {
    /// No emoji prefix; content is rendered as-is.
    #[default]
    Plain,
    Info,
    Success,
    Warning,
    Error,
}

impl MessageLevel {
    /// Get emoji representation for the message level
    pub fn emoji(&self) -> Option<&'static str> {
        match self {
            Self::Plain => None,
            Self::Info => Some("ℹ️"),
            Self::Success => Some("✅"),
            Self::Warning => Some("⚠️"),
            Self::Error => Some("❌"),
        }
    }
}

/// Optional profile fields attached to an inbound sender.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl SenderProfile {
    pub fn new(
        first_name: Option<String>,
        last_name: Option<String>,
        username: Option<String>,
    ) -> Self {
        Self {
            first_name,
            last_name,
            username,
        }
    }
}

/// Inbound event from the transport
///
/// `text` is `None` for media-only messages so callers can emit a
/// validation prompt instead of silently dropping the event.
/// Category selections arrive as `callback_data` payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Transport-assigned message ID
    pub id: String,
    /// Sender identifier in the transport
    pub sender_id: String,
    /// Conversation identifier (chat ID)
    pub conversation_id: String,
    /// Textual content, if any
    pub text: Option<String>,
    /// ID of the message this one replies to, if any
    pub reply_to: Option<String>,
    /// Structured callback payload (inline button press), if any
    pub callback_data: Option<String>,
    /// Sender profile fields
    pub profile: SenderProfile,
    /// Timestamp (milliseconds since epoch)
    pub timestamp: i64,
}

impl InboundMessage {
    /// Create a new inbound message without content
    pub fn new(
        id: impl Into<String>,
        sender_id: impl Into<String>,
        conversation_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            sender_id: sender_id.into(),
            conversation_id: conversation_id.into(),
            text: None,
            reply_to: None,
            callback_data: None,
            profile: SenderProfile::default(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Create a new text message
    pub fn text(
        id: impl Into<String>,
        sender_id: impl Into<String>,
        conversation_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::new(id, sender_id, conversation_id).with_text(text)
    }

    /// Set textual content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set reply_to
    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// Set callback payload
    pub fn with_callback_data(mut self, data: impl Into<String>) -> Self {
        self.callback_data = Some(data.into());
        self
    }

    /// Set sender profile
    pub fn with_profile(mut self, profile: SenderProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Textual content trimmed, or `None` when absent or whitespace-only
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Inline keyboard button carrying a callback payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Keyboard directive attached to an outbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyMarkup {
    /// Persistent reply keyboard (rows of button labels)
    Keyboard(Vec<Vec<String>>),
    /// Inline keyboard (rows of callback buttons)
    Inline(Vec<Vec<InlineButton>>),
}

/// Outbound message to the transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Conversation identifier
    pub conversation_id: String,
    /// Message content
    pub content: String,
    /// Message level for formatting
    pub level: MessageLevel,
    /// Optional keyboard directive
    pub reply_markup: Option<ReplyMarkup>,
    /// Parse mode (markdown, html, plain)
    pub parse_mode: Option<String>,
}

impl OutboundMessage {
    /// Create a new plain outbound message
    pub fn new(conversation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            content: content.into(),
            level: MessageLevel::Plain,
            reply_markup: None,
            parse_mode: None,
        }
    }

    /// Set message level
    pub fn with_level(mut self, level: MessageLevel) -> Self {
        self.level = level;
        self
    }

    /// Set keyboard directive
    pub fn with_reply_markup(mut self, markup: ReplyMarkup) -> Self {
        self.reply_markup = Some(markup);
        self
    }

    /// Set parse mode
    pub fn with_parse_mode(mut self, mode: impl Into<String>) -> Self {
        self.parse_mode = Some(mode.into());
        self
    }

    /// Create a success message
    pub fn success(conversation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(conversation_id, content).with_level(MessageLevel::Success)
    }

    /// Create an error message
    pub fn error(conversation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(conversation_id, content).with_level(MessageLevel::Error)
    }

    /// Create a warning message
    pub fn warning(conversation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(conversation_id, content).with_level(MessageLevel::Warning)
    }

    /// Format the message with emoji prefix based on level
    pub fn formatted_content(&self) -> String {
        match self.level.emoji() {
            Some(emoji) => format!("{} {}", emoji, self.content),
            None => self.content.clone(),
        }
    }
}

/// Receipt for a delivered outbound message
///
/// The transport-assigned `message_id` is the reverse-routing key for
/// operator replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub message_id: String,
}

impl SentMessage {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
        }
    }
}
