//! Service layer error types
//!
//! Every variant is recoverable: the view model turns them into notices and
//! stays usable.

use chat_core::DomainError;
use std::fmt;
use validator::ValidationErrors;

use crate::dto::Notice;

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Channel intent could not be turned into a channel
    AddressResolution(DomainError),

    /// Draft was empty or whitespace only
    EmptyMessage,

    /// Local validation failure
    Validation(String),

    /// Store rejected an append
    Send(DomainError),

    /// Delete refused locally or by the store
    Delete(DomainError),

    /// Store could not establish the live stream
    Subscription(DomainError),

    /// Directory data could not be loaded
    Directory(DomainError),

    /// Internal error
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressResolution(e) => write!(f, "Could not open channel: {e}"),
            Self::EmptyMessage => write!(f, "Message is empty"),
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::Send(e) => write!(f, "Message not sent: {e}"),
            Self::Delete(e) => write!(f, "Message not deleted: {e}"),
            Self::Subscription(e) => write!(f, "Could not subscribe: {e}"),
            Self::Directory(e) => write!(f, "Could not load directory: {e}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.domain_error()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl ServiceError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Underlying domain error, if any
    pub fn domain_error(&self) -> Option<&DomainError> {
        match self {
            Self::AddressResolution(e)
            | Self::Send(e)
            | Self::Delete(e)
            | Self::Subscription(e)
            | Self::Directory(e) => Some(e),
            Self::EmptyMessage | Self::Validation(_) | Self::Internal(_) => None,
        }
    }

    /// Stable code for the error category
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AddressResolution(_) => "ADDRESS_RESOLUTION_FAILED",
            Self::EmptyMessage => "EMPTY_MESSAGE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Send(_) => "SEND_FAILED",
            Self::Delete(_) => "DELETE_FAILED",
            Self::Subscription(_) => "SUBSCRIPTION_FAILED",
            Self::Directory(_) => "DIRECTORY_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Errors that block an action without telling the user
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::EmptyMessage)
    }

    /// User-facing notice, `None` for silent errors
    pub fn to_notice(&self) -> Option<Notice> {
        if self.is_silent() {
            return None;
        }

        Some(Notice {
            code: self.error_code().to_string(),
            detail: self.domain_error().map(|e| e.code().to_string()),
            message: self.to_string(),
        })
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
