//! Header grouping for rendered message lists

use chat_core::{Message, Snowflake};
use chrono::Duration;

use crate::dto::MessageRow;

/// Whether each message starts a new header block.
///
/// A header is shown for the first message, when the sender changes, and
/// when more than `gap` passed since the previous message.
pub fn header_flags(messages: &[Message], gap: Duration) -> Vec<bool> {
    let mut flags = Vec::with_capacity(messages.len());
    let mut previous: Option<&Message> = None;

    for message in messages {
        let show = previous.is_none_or(|prev| {
            prev.sender_id != message.sender_id || message.timestamp - prev.timestamp > gap
        });
        flags.push(show);
        previous = Some(message);
    }

    flags
}

/// Rows for rendering `messages` to `viewer`
pub fn group_rows(messages: &[Message], viewer: Snowflake, gap: Duration) -> Vec<MessageRow> {
    messages
        .iter()
        .zip(header_flags(messages, gap))
        .map(|(message, show_header)| MessageRow {
            message: message.clone(),
            show_header,
            is_mine: message.is_from(viewer),
        })
        .collect()
}
