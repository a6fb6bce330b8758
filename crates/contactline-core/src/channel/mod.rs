//! Messaging Transport Layer
//!
//! Transport-facing types and the Telegram implementation. The relay engine
//! only sees the `Transport` trait, so tests can swap in a mock and other
//! providers can be added without touching the state machine.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            RelayEngine                  │
//! └─────────────────────────────────────────┘
//!              │
//!              ▼
//! ┌─────────────────────────────────────────┐
//! │         trait Transport                 │
//! │  - send(message) -> SentMessage         │
//! │  - delete_message(chat, id)             │
//! │  - start_receiving() -> Stream          │
//! └─────────────────────────────────────────┘
//!              │
//!              ▼
//!          Telegram
//! ```

pub mod telegram;
mod traits;
mod types;

pub use telegram::{TelegramConfig, TelegramTransport};
pub use traits::Transport;
pub use types::{
    InboundMessage, InlineButton, MessageLevel, OutboundMessage, ReplyMarkup, SenderProfile,
    SentMessage,
};

#[cfg(test)]
pub use traits::mock;
