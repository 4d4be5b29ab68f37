//! Store traits (ports) - the narrow interface to the external document store
//!
//! The messaging core is the sole caller of these operations. Any backend
//! with a live-query mechanism can sit behind them; `chat-store` ships an
//! in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::entities::{Group, Message, OutboundMessage, UserSummary};
use crate::error::DomainError;
use crate::value_objects::{DmKey, Snowflake, StoragePath};

/// Result type for store operations
pub type StoreResult<T> = Result<T, DomainError>;

/// Callback receiving full, timestamp-ordered snapshots of a message stream.
/// Invoked from the store's delivery context, possibly on another task.
pub type SnapshotCallback = Arc<dyn Fn(Vec<Message>) + Send + Sync>;

/// Live subscription returned by [`MessageStore::subscribe`]
pub trait SubscriptionHandle: Send + Sync {
    /// Stop delivering snapshots. Must not block on in-flight deliveries.
    fn unsubscribe(&self);
}

// ============================================================================
// Message Store
// ============================================================================

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Start a live query on `path`. The callback receives the current
    /// snapshot first and a fresh snapshot on every change afterwards.
    async fn subscribe(
        &self,
        path: &StoragePath,
        on_snapshot: SnapshotCallback,
    ) -> StoreResult<Box<dyn SubscriptionHandle>>;

    /// Append-only write. Returns the message with its assigned id and time.
    async fn append_message(
        &self,
        path: &StoragePath,
        message: &OutboundMessage,
    ) -> StoreResult<Message>;

    /// Delete a message. Stores must refuse deletion by anyone but the sender.
    async fn delete_message(
        &self,
        path: &StoragePath,
        message_id: Snowflake,
        requester: Snowflake,
    ) -> StoreResult<()>;

    /// Look up the DM stream for `key`, creating it (and recording both
    /// participants) on first use. Concurrent calls for one key must converge.
    async fn find_or_create_dm_storage_path(&self, key: &DmKey) -> StoreResult<StoragePath>;

    /// DM conversations `user_id` takes part in
    async fn list_dm_channels(&self, user_id: Snowflake) -> StoreResult<Vec<DmKey>>;
}

// ============================================================================
// Directory Store
// ============================================================================

/// Read-only directory data; no live queries
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Groups whose member set contains `user_id`
    async fn list_groups_for_user(&self, user_id: Snowflake) -> StoreResult<Vec<Group>>;

    async fn list_users(&self) -> StoreResult<Vec<UserSummary>>;

    async fn find_user(&self, user_id: Snowflake) -> StoreResult<Option<UserSummary>>;

    async fn find_group(&self, group_id: Snowflake) -> StoreResult<Option<Group>>;
}
