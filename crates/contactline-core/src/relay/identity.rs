//! Sender identity formatting.

use crate::channel::SenderProfile;

/// Fallback label when the profile carries no usable field.
const UNKNOWN_SENDER: &str = "Unknown sender";

/// Derive a human-readable label for a sender.
///
/// First and last name win when either is present; otherwise the handle;
/// otherwise a fixed fallback. Pure function, no failure modes.
pub fn sender_label(profile: &SenderProfile) -> String {
    let name = [profile.first_name.as_deref(), profile.last_name.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if !name.is_empty() {
        return match profile.username.as_deref().map(str::trim) {
            Some(handle) if !handle.is_empty() => format!("{} (@{})", name, handle),
            _ => name,
        };
    }

    match profile.username.as_deref().map(str::trim) {
        Some(handle) if !handle.is_empty() => format!("@{}", handle),
        _ => UNKNOWN_SENDER.to_string(),
    }
}
