//! # chat-core
//!
//! Domain layer for the messaging core: channels, messages, groups, ids,
//! storage paths, and the traits the external document store implements.
//! This crate has no dependency on a concrete store or runtime.

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Channel, ChannelId, ChannelKind, Group, Identity, Message, OutboundMessage, PresenceHint,
    ReplySnapshot, UserSummary,
};
pub use error::DomainError;
pub use traits::{DirectoryStore, MessageStore, SnapshotCallback, StoreResult, SubscriptionHandle};
pub use value_objects::{
    DmKey, Snowflake, SnowflakeGenerator, SnowflakeParseError, StoragePath, StorageScope,
};
