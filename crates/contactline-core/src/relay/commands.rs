//! Command literals, button labels, prompts, and keyboards.

use crate::channel::{InlineButton, ReplyMarkup};

use super::package::Category;

/// Recognized slash commands.
pub const CMD_START: &str = "/start";
pub const CMD_HELP: &str = "/help";
pub const CMD_CANCEL: &str = "/cancel";

/// Fixed reply-keyboard button labels.
pub const BUTTON_CONTACT: &str = "📨 Contact admin";
pub const BUTTON_ABOUT: &str = "ℹ️ About this bot";
pub const BUTTON_RESET: &str = "🔄 Reset";

/// Persistent main menu shown with the welcome message.
pub fn main_keyboard() -> ReplyMarkup {
    ReplyMarkup::Keyboard(vec![
        vec![BUTTON_CONTACT.to_string(), BUTTON_ABOUT.to_string()],
        vec![BUTTON_RESET.to_string()],
    ])
}

/// Inline keyboard with the category options.
pub fn category_keyboard() -> ReplyMarkup {
    let button = |emoji: &str, category: Category| {
        InlineButton::new(
            format!("{} {}", emoji, category.label()),
            category.callback_data(),
        )
    };
    ReplyMarkup::Inline(vec![
        vec![button("💬", Category::General), button("💼", Category::Work)],
        vec![button("🐞", Category::Bug), button("❓", Category::Other)],
    ])
}

pub fn welcome_text() -> &'static str {
    "👋 Welcome!\n\n\
     This bot forwards your message straight to the admin, and their reply \
     lands right back here.\n\n\
     👇 Use the buttons below to get started."
}

pub fn about_text() -> &'static str {
    "ℹ️ This bot is a simple contact line.\n\n\
     ✅ Your message goes straight to the admin\n\
     ✅ Replies show up right here\n\
     ✅ No setup needed, just write"
}

pub fn category_prompt_text() -> &'static str {
    "📨 What kind of message do you want to send?"
}

pub fn message_prompt_after_category(category: Category) -> String {
    format!(
        "✍️ Got it, \"{}\" selected. Now write your message.\n\n\
         Send /cancel at any time to abort.",
        category.label()
    )
}

pub fn message_prompt_text() -> &'static str {
    "✍️ Write your message and I'll pass it on.\n\nSend /cancel at any time to abort."
}

pub fn contact_prompt_text() -> &'static str {
    "📧 If you like, add an email / username / other way to reach you.\n\n\
     Send \"skip\" to leave it out."
}

pub fn text_required_text() -> &'static str {
    "Please send your message as text."
}

pub fn ack_text() -> &'static str {
    "Thanks! Your message has been delivered. The reply will arrive right here."
}

pub fn cancel_text() -> &'static str {
    "❌ Contact flow cancelled. Press \"📨 Contact admin\" or /start to begin again."
}

pub fn reset_done_text() -> &'static str {
    "🔄 All set. Your conversation state has been cleared."
}

pub fn operator_help_text() -> &'static str {
    "👋 You are the operator.\n\n\
     When a user writes to this bot you receive a contact card here. \
     Reply to that card and the bot forwards your answer to the user."
}

pub fn operator_hint_text() -> &'static str {
    "ℹ️ Operator mode: reply to a contact card to answer that user."
}

pub fn no_linked_user_text() -> &'static str {
    "No linked user found for this message. Reply directly to a contact card."
}

pub fn text_replies_only_text() -> &'static str {
    "Only text replies are supported for now."
}

pub fn reply_delivered_text() -> &'static str {
    "Reply delivered to the user."
}

pub fn reply_failed_text() -> &'static str {
    "Failed to deliver the reply. The user may have blocked the bot."
}

pub fn admin_reply(text: &str) -> String {
    format!("📨 Reply from admin:\n\n{}", text)
}
