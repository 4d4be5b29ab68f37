//! Request DTOs - user intents handed to the view model

use chat_core::Snowflake;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

// ============================================================================
// Channel Requests
// ============================================================================

/// Which channel the user wants to open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelIntent {
    /// Open a configured public channel by name
    Public { name: String },
    /// Open a group channel; a blank display name is looked up
    Group {
        group_id: Snowflake,
        #[serde(default)]
        display_name: String,
    },
    /// Start or reopen a direct message with another user
    Direct { user_id: Snowflake },
}

impl ChannelIntent {
    pub fn public(name: impl Into<String>) -> Self {
        Self::Public { name: name.into() }
    }

    pub fn group(group_id: Snowflake, display_name: impl Into<String>) -> Self {
        Self::Group {
            group_id,
            display_name: display_name.into(),
        }
    }

    pub fn direct(user_id: Snowflake) -> Self {
        Self::Direct { user_id }
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Public { .. } => "public",
            Self::Group { .. } => "group",
            Self::Direct { .. } => "dm",
        }
    }
}

// ============================================================================
// Message Requests
// ============================================================================

/// Send message request, built from the trimmed draft
#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_text_length"))]
pub struct SendMessageRequest {
    #[validate(length(min = 1, message = "Message must not be empty"))]
    pub text: String,

    /// Configured maximum length in characters
    pub max_length: usize,
}

impl SendMessageRequest {
    pub fn new(text: impl Into<String>, max_length: usize) -> Self {
        Self {
            text: text.into(),
            max_length,
        }
    }
}

fn validate_text_length(request: &SendMessageRequest) -> Result<(), ValidationError> {
    if request.text.chars().count() > request.max_length {
        let mut err = ValidationError::new("too_long");
        err.message = Some(
            format!(
                "Message must be at most {} characters",
                request.max_length
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_validation() {
        let valid = SendMessageRequest::new("Hello, world!", 2000);
        assert!(valid.validate().is_ok());

        let empty = SendMessageRequest::new("", 2000);
        assert!(empty.validate().is_err());

        let too_long = SendMessageRequest::new("a".repeat(2001), 2000);
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_length_counts_characters() {
        // 4 chars, 16 bytes
        let emoji = SendMessageRequest::new("🦀🦀🦀🦀", 4);
        assert!(emoji.validate().is_ok());
    }

    #[test]
    fn test_intent_serialization() {
        let intent = ChannelIntent::direct(Snowflake::new(42));
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["type"], "direct");
        assert_eq!(json["user_id"], "42");

        let parsed: ChannelIntent =
            serde_json::from_str(r#"{"type":"group","group_id":"7"}"#).unwrap();
        assert_eq!(parsed, ChannelIntent::group(Snowflake::new(7), ""));
    }
}
