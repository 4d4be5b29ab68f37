//! Message entity - a chat message and its reply quote

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Immutable copy of a quoted message, taken when the reply is sent.
/// It is never refreshed: later deletion of the original leaves it intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplySnapshot {
    pub message_id: Snowflake,
    pub sender_name: String,
    pub text: String,
}

impl ReplySnapshot {
    /// Capture the quoted fields of `message`
    #[must_use]
    pub fn capture(message: &Message) -> Self {
        Self {
            message_id: message.id,
            sender_name: message.sender_name.clone(),
            text: message.text.clone(),
        }
    }

    /// Quote text shortened for display
    #[must_use]
    pub fn preview(&self, max_len: usize) -> &str {
        truncate_on_char_boundary(&self.text, max_len)
    }
}

/// Message as stored and delivered in snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    pub sender_id: Snowflake,
    pub sender_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplySnapshot>,
}

impl Message {
    /// Materialize an outbound message with the id and time the store assigned
    #[must_use]
    pub fn from_outbound(id: Snowflake, timestamp: DateTime<Utc>, outbound: OutboundMessage) -> Self {
        Self {
            id,
            sender_id: outbound.sender_id,
            sender_name: outbound.sender_name,
            text: outbound.text,
            timestamp,
            reply_to: outbound.reply_to,
        }
    }

    #[inline]
    pub fn is_reply(&self) -> bool {
        self.reply_to.is_some()
    }

    #[inline]
    pub fn is_from(&self, user_id: Snowflake) -> bool {
        self.sender_id == user_id
    }

    /// Text shortened for previews and notifications
    pub fn preview(&self, max_len: usize) -> &str {
        truncate_on_char_boundary(&self.text, max_len)
    }
}

/// Message built by the composer, before the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub sender_id: Snowflake,
    pub sender_name: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplySnapshot>,
}

fn truncate_on_char_boundary(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: i64, text: &str) -> Message {
        Message {
            id: Snowflake::new(id),
            sender_id: Snowflake::new(200),
            sender_name: "Ada".to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
            reply_to: None,
        }
    }

    #[test]
    fn test_from_outbound_keeps_reply() {
        let quoted = message(1, "original");
        let outbound = OutboundMessage {
            sender_id: Snowflake::new(300),
            sender_name: "Bo".to_string(),
            text: "answer".to_string(),
            reply_to: Some(ReplySnapshot::capture(&quoted)),
        };
        let msg = Message::from_outbound(Snowflake::new(2), Utc::now(), outbound);

        assert!(msg.is_reply());
        assert!(msg.is_from(Snowflake::new(300)));
        let quote = msg.reply_to.unwrap();
        assert_eq!(quote.message_id, Snowflake::new(1));
        assert_eq!(quote.text, "original");
        assert_eq!(quote.sender_name, "Ada");
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut quoted = message(1, "before");
        let snapshot = ReplySnapshot::capture(&quoted);
        quoted.text = "after".to_string();
        assert_eq!(snapshot.text, "before");
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let msg = message(1, "héllo");
        assert_eq!(msg.preview(2), "h");
        assert_eq!(msg.preview(3), "hé");
        assert_eq!(msg.preview(100), "héllo");
    }

    #[test]
    fn test_reply_skipped_in_json_when_absent() {
        let json = serde_json::to_value(message(1, "hi")).unwrap();
        assert!(json.get("reply_to").is_none());
        assert_eq!(json["id"], "1");
    }
}
