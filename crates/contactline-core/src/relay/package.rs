//! Relay package: the assembled unit forwarded to the operator.

use crate::channel::SenderProfile;

use super::identity::sender_label;

/// Prefix carried by category selection callbacks (`category:<key>`).
const CATEGORY_PREFIX: &str = "category:";

/// Category chosen by the user for a contact flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    General,
    Work,
    Bug,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::General,
        Category::Work,
        Category::Bug,
        Category::Other,
    ];

    /// Stable key used in callback payloads.
    pub fn key(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Work => "work",
            Self::Bug => "bug",
            Self::Other => "other",
        }
    }

    /// Display label shown to users and on the contact card.
    pub fn label(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Work => "Work / Project",
            Self::Bug => "Bug / Problem",
            Self::Other => "Other",
        }
    }

    /// Callback payload for this category's inline button.
    pub fn callback_data(&self) -> String {
        format!("{}{}", CATEGORY_PREFIX, self.key())
    }

    /// Parse a `category:<key>` callback payload.
    ///
    /// Returns `None` for malformed or unknown payloads, which callers
    /// acknowledge and ignore.
    pub fn parse_callback(data: &str) -> Option<Self> {
        let key = data.strip_prefix(CATEGORY_PREFIX)?;
        match key {
            "general" => Some(Self::General),
            "work" => Some(Self::Work),
            "bug" => Some(Self::Bug),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// The assembled contact unit delivered to the operator.
#[derive(Debug, Clone)]
pub struct RelayPackage {
    /// Human-readable sender label (never a raw identifier).
    pub sender_label: String,
    /// Conversation the package originated from; reverse-routing target.
    pub sender_conversation: String,
    /// Category label; "Simple message" for one-shot packages.
    pub category_label: String,
    /// Message body, if the user provided text.
    pub message: Option<String>,
    /// User-supplied contact detail, empty when skipped.
    pub contact_info: Option<String>,
}

impl RelayPackage {
    /// Label used for packages relayed outside the multi-step flow.
    pub const ONE_SHOT_CATEGORY: &'static str = "Simple message";

    pub fn new(
        profile: &SenderProfile,
        sender_conversation: impl Into<String>,
        category_label: impl Into<String>,
        message: Option<String>,
        contact_info: Option<String>,
    ) -> Self {
        Self {
            sender_label: sender_label(profile),
            sender_conversation: sender_conversation.into(),
            category_label: category_label.into(),
            message,
            contact_info,
        }
    }

    /// One-shot package for a message sent outside any flow.
    pub fn one_shot(
        profile: &SenderProfile,
        sender_conversation: impl Into<String>,
        message: Option<String>,
    ) -> Self {
        Self::new(
            profile,
            sender_conversation,
            Self::ONE_SHOT_CATEGORY,
            message,
            None,
        )
    }

    /// Format the contact card delivered to the operator.
    pub fn format_card(&self) -> String {
        let message = self
            .message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or("(no text)");
        let contact = self
            .contact_info
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or("Not provided");

        format!(
            "📩 New contact message\n\n\
             From: {}\n\
             Category: {}\n\n\
             Message:\n{}\n\n\
             Contact info:\n{}\n\n\
             💬 Reply to this message to answer the user.",
            self.sender_label, self.category_label, message, contact
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> SenderProfile {
        SenderProfile::new(Some("John".to_string()), Some("Doe".to_string()), None)
    }

    #[test]
    fn test_category_callback_round_trip() {
        for category in Category::ALL {
            assert_eq!(
                Category::parse_callback(&category.callback_data()),
                Some(category)
            );
        }
    }

    #[test]
    fn test_parse_callback_rejects_malformed_payloads() {
        assert_eq!(Category::parse_callback("category:spam"), None);
        assert_eq!(Category::parse_callback("cat:general"), None);
        assert_eq!(Category::parse_callback(""), None);
    }

    #[test]
    fn test_format_card_full() {
        let package = RelayPackage::new(
            &profile(),
            "chat-1",
            Category::Bug.label(),
            Some("app crashes".to_string()),
            None,
        );
        let card = package.format_card();

        assert!(card.contains("John Doe"));
        assert!(card.contains("Bug / Problem"));
        assert!(card.contains("app crashes"));
        assert!(card.contains("Not provided"));
    }

    #[test]
    fn test_format_card_placeholders() {
        let package = RelayPackage::one_shot(&profile(), "chat-1", None);
        let card = package.format_card();

        assert!(card.contains("Simple message"));
        assert!(card.contains("(no text)"));
        assert!(card.contains("Not provided"));
    }

    #[test]
    fn test_empty_contact_info_renders_placeholder() {
        let package = RelayPackage::new(
            &profile(),
            "chat-1",
            Category::General.label(),
            Some("hello".to_string()),
            Some("".to_string()),
        );
        assert!(package.format_card().contains("Not provided"));
    }
}
