//! Contact relay between end users and a single operator.
//!
//! Inbound events are classified by [`router`], then handled by the
//! [`engine`]: multi-step contact flows are tracked in [`session`],
//! relayed cards are linked back to their senders through [`registry`],
//! and [`reset`] clears everything on demand.
//!
//! ```text
//! user ──▶ classify ──▶ session steps ──▶ RelayPackage ──▶ operator
//!                                             │
//! user ◀── admin reply ◀── registry lookup ◀──┘ (reply to card)
//! ```

pub mod commands;
pub mod engine;
pub mod identity;
pub mod package;
pub mod registry;
pub mod reset;
pub mod router;
pub mod sent_log;
pub mod session;

pub use engine::{RelayEngine, RelayFlags};
pub use package::{Category, RelayPackage};
pub use registry::ReplyAddressRegistry;
pub use reset::ResetController;
pub use router::{classify, OperatorAction, RouteDecision, UserAction};
pub use sent_log::SentMessageLog;
pub use session::{SessionStore, Step, UserSession};
