//! Single-pass filters over an already fetched message history.

use crate::pumble::models::Message;

/// Messages whose text contains `term`, ignoring case. Order is preserved.
#[must_use]
pub fn matching_text(messages: Vec<Message>, term: &str) -> Vec<Message> {
    let term = term.to_lowercase();
    messages
        .into_iter()
        .filter(|message| message.text.to_lowercase().contains(&term))
        .collect()
}

/// Messages written by `user_id`. Order is preserved.
#[must_use]
pub fn from_user(messages: Vec<Message>, user_id: &str) -> Vec<Message> {
    messages
        .into_iter()
        .filter(|message| message.is_from(user_id))
        .collect()
}
