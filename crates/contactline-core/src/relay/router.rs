//! Inbound event classification.
//!
//! Decides what an inbound event is (operator traffic vs user traffic,
//! commands vs buttons vs callbacks vs free text) before the engine
//! consults session state.

use crate::channel::InboundMessage;

use super::commands::{BUTTON_ABOUT, BUTTON_CONTACT, BUTTON_RESET, CMD_CANCEL, CMD_HELP, CMD_START};

/// What the operator's inbound event asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorAction {
    /// Reply to a previously relayed message; carries the replied-to ID.
    Reply { reply_to: String },
    /// `/start` or `/help`.
    Help,
    /// "Reset" button: clear the whole reply-address registry.
    Reset,
    /// Anything else: remind the operator how routing works.
    Hint,
}

/// What a user's inbound event asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// `/start` or `/help`: welcome plus menu.
    Welcome,
    /// `/cancel`: abort any in-flight flow.
    Cancel,
    /// "Contact admin" button: begin the contact flow.
    StartContact,
    /// "About" button.
    About,
    /// "Reset" button.
    Reset,
    /// Inline category selection; carries the raw payload.
    CategorySelection { payload: String },
    /// Free input: session step decides, or one-shot relay when no
    /// session exists. Covers media-only events (`text` = None).
    Input,
}

/// Classification of one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Operator(OperatorAction),
    User(UserAction),
}

/// Classify an inbound event.
///
/// Operator status is decided by conversation identity, never by message
/// content.
pub fn classify(message: &InboundMessage, operator_conversation: &str) -> RouteDecision {
    if message.conversation_id == operator_conversation {
        return RouteDecision::Operator(classify_operator(message));
    }
    RouteDecision::User(classify_user(message))
}

fn classify_operator(message: &InboundMessage) -> OperatorAction {
    if let Some(reply_to) = &message.reply_to {
        return OperatorAction::Reply {
            reply_to: reply_to.clone(),
        };
    }
    match message.trimmed_text() {
        Some(CMD_START) | Some(CMD_HELP) => OperatorAction::Help,
        Some(BUTTON_RESET) => OperatorAction::Reset,
        _ => OperatorAction::Hint,
    }
}

fn classify_user(message: &InboundMessage) -> UserAction {
    if let Some(payload) = &message.callback_data {
        return UserAction::CategorySelection {
            payload: payload.clone(),
        };
    }
    match message.trimmed_text() {
        Some(CMD_START) | Some(CMD_HELP) => UserAction::Welcome,
        Some(CMD_CANCEL) => UserAction::Cancel,
        Some(BUTTON_CONTACT) => UserAction::StartContact,
        Some(BUTTON_ABOUT) => UserAction::About,
        Some(BUTTON_RESET) => UserAction::Reset,
        _ => UserAction::Input,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPERATOR: &str = "op-chat";

    fn user_text(text: &str) -> InboundMessage {
        InboundMessage::text("msg-1", "user-1", "chat-1", text)
    }

    #[test]
    fn test_user_commands_and_buttons() {
        let cases = [
            ("/start", UserAction::Welcome),
            ("/help", UserAction::Welcome),
            ("/cancel", UserAction::Cancel),
            (BUTTON_CONTACT, UserAction::StartContact),
            (BUTTON_ABOUT, UserAction::About),
            (BUTTON_RESET, UserAction::Reset),
            ("hello there", UserAction::Input),
        ];
        for (text, expected) in cases {
            assert_eq!(
                classify(&user_text(text), OPERATOR),
                RouteDecision::User(expected),
                "text: {text}"
            );
        }
    }

    #[test]
    fn test_user_media_is_input() {
        let media = InboundMessage::new("msg-1", "user-1", "chat-1");
        assert_eq!(
            classify(&media, OPERATOR),
            RouteDecision::User(UserAction::Input)
        );
    }

    #[test]
    fn test_user_callback_payload() {
        let callback = InboundMessage::new("cb-1", "user-1", "chat-1")
            .with_callback_data("category:bug");
        assert_eq!(
            classify(&callback, OPERATOR),
            RouteDecision::User(UserAction::CategorySelection {
                payload: "category:bug".to_string()
            })
        );
    }

    #[test]
    fn test_operator_reply_beats_commands() {
        let reply = InboundMessage::text("msg-1", "op", OPERATOR, "/help").with_reply_to("88");
        assert_eq!(
            classify(&reply, OPERATOR),
            RouteDecision::Operator(OperatorAction::Reply {
                reply_to: "88".to_string()
            })
        );
    }

    #[test]
    fn test_operator_help_and_hint() {
        let help = InboundMessage::text("msg-1", "op", OPERATOR, "/start");
        assert_eq!(
            classify(&help, OPERATOR),
            RouteDecision::Operator(OperatorAction::Help)
        );

        let chatter = InboundMessage::text("msg-2", "op", OPERATOR, "hello?");
        assert_eq!(
            classify(&chatter, OPERATOR),
            RouteDecision::Operator(OperatorAction::Hint)
        );
    }

    #[test]
    fn test_operator_reset_button() {
        let reset = InboundMessage::text("msg-1", "op", OPERATOR, BUTTON_RESET);
        assert_eq!(
            classify(&reset, OPERATOR),
            RouteDecision::Operator(OperatorAction::Reset)
        );
    }
}
