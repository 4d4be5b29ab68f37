//! Domain errors - failures raised by domain rules and by the store

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain and store errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("User not found: {0}")]
    UserNotFound(Snowflake),

    #[error("Group not found: {0}")]
    GroupNotFound(Snowflake),

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Message not found: {0}")]
    MessageNotFound(Snowflake),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Cannot open a direct message with yourself")]
    SelfDirectMessage,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Invalid storage path: {0}")]
    InvalidStoragePath(String),

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Not message sender")]
    NotMessageSender,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // =========================================================================
    // Store Errors
    // =========================================================================
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Subscription rejected: {0}")]
    SubscriptionRejected(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Stable error code for notices and logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "UNKNOWN_USER",
            Self::GroupNotFound(_) => "UNKNOWN_GROUP",
            Self::ChannelNotFound(_) => "UNKNOWN_CHANNEL",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",

            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::SelfDirectMessage => "SELF_DIRECT_MESSAGE",
            Self::EmptyMessage => "EMPTY_MESSAGE",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::InvalidStoragePath(_) => "INVALID_STORAGE_PATH",

            Self::NotMessageSender => "NOT_MESSAGE_SENDER",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",

            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::SubscriptionRejected(_) => "SUBSCRIPTION_REJECTED",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_)
                | Self::GroupNotFound(_)
                | Self::ChannelNotFound(_)
                | Self::MessageNotFound(_)
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::SelfDirectMessage
                | Self::EmptyMessage
                | Self::ContentTooLong { .. }
                | Self::InvalidStoragePath(_)
        )
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::NotMessageSender | Self::PermissionDenied(_))
    }

    /// Failures a user may reasonably retry by hand
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::SubscriptionRejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DomainError::UserNotFound(Snowflake::new(1)).code(), "UNKNOWN_USER");
        assert_eq!(DomainError::SelfDirectMessage.code(), "SELF_DIRECT_MESSAGE");
        assert_eq!(
            DomainError::PermissionDenied("append".to_string()).code(),
            "PERMISSION_DENIED"
        );
    }

    #[test]
    fn test_classification() {
        assert!(DomainError::GroupNotFound(Snowflake::new(1)).is_not_found());
        assert!(DomainError::SelfDirectMessage.is_validation());
        assert!(DomainError::NotMessageSender.is_authorization());
        assert!(DomainError::StoreUnavailable("down".to_string()).is_transient());
        assert!(!DomainError::NotMessageSender.is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::UserNotFound(Snowflake::new(123));
        assert_eq!(err.to_string(), "User not found: 123");

        let err = DomainError::ContentTooLong { max: 2000 };
        assert_eq!(err.to_string(), "Content too long: max 2000 characters");
    }
}
