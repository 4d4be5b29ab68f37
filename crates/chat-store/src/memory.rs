//! In-memory implementation of the message and directory stores.
//!
//! Holds every stream, direct-message registration, user, and group in
//! concurrent maps. Cloning the store is cheap and every clone shares the
//! same data, so one instance can back several clients in tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chat_common::StoreConfig;
use chat_core::{
    DirectoryStore, DmKey, DomainError, Group, Message, MessageStore, OutboundMessage,
    SnapshotCallback, Snowflake, SnowflakeGenerator, StoragePath, StoreResult,
    SubscriptionHandle, UserSummary,
};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::instrument;

use crate::stream::{LiveQuery, LiveQueryStats, MessageStream};

/// Registration of a two-party conversation
#[derive(Debug, Clone)]
pub struct DmRecord {
    pub channel_id: Snowflake,
    pub participants: [Snowflake; 2],
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Faults {
    reject_appends: AtomicBool,
    reject_subscriptions: AtomicBool,
}

struct Inner {
    history_limit: usize,
    ids: SnowflakeGenerator,
    streams: DashMap<StoragePath, MessageStream>,
    dm_channels: DashMap<DmKey, DmRecord>,
    users: DashMap<Snowflake, UserSummary>,
    groups: DashMap<Snowflake, Group>,
    faults: Faults,
    appends: AtomicUsize,
    live_queries: Arc<LiveQueryStats>,
}

/// Shared in-memory document store
#[derive(Clone)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                history_limit: config.history_limit.max(1),
                ids: SnowflakeGenerator::new(config.worker_id),
                streams: DashMap::new(),
                dm_channels: DashMap::new(),
                users: DashMap::new(),
                groups: DashMap::new(),
                faults: Faults::default(),
                appends: AtomicUsize::new(0),
                live_queries: Arc::new(LiveQueryStats::default()),
            }),
        }
    }

    /// Allocate a fresh id from the store's generator
    pub fn next_id(&self) -> Snowflake {
        self.inner.ids.generate()
    }

    // ---- seeding ----

    pub fn add_user(&self, user: UserSummary) {
        tracing::debug!(user_id = %user.id, name = %user.display_name, "Seeding user");
        self.inner.users.insert(user.id, user);
    }

    pub fn add_group(&self, group: Group) {
        tracing::debug!(group_id = %group.id, name = %group.name, "Seeding group");
        self.inner.groups.insert(group.id, group);
    }

    /// Record a login for `user_id`, returns false for unknown users
    pub fn touch_login(&self, user_id: Snowflake, at: DateTime<Utc>) -> bool {
        match self.inner.users.get_mut(&user_id) {
            Some(mut user) => {
                user.last_login = Some(at);
                true
            }
            None => false,
        }
    }

    // ---- fault injection ----

    pub fn reject_appends(&self, reject: bool) {
        self.inner.faults.reject_appends.store(reject, Ordering::SeqCst);
    }

    pub fn reject_subscriptions(&self, reject: bool) {
        self.inner
            .faults
            .reject_subscriptions
            .store(reject, Ordering::SeqCst);
    }

    // ---- inspection ----

    /// Number of live queries that have not been unsubscribed
    pub fn live_subscription_count(&self) -> usize {
        self.inner.live_queries.live.load(Ordering::SeqCst)
    }

    /// Total `unsubscribe` calls across all handles
    pub fn unsubscribe_call_count(&self) -> usize {
        self.inner.live_queries.unsubscribe_calls.load(Ordering::SeqCst)
    }

    /// `unsubscribe` calls that hit an already closed handle
    pub fn repeated_unsubscribe_count(&self) -> usize {
        self.inner.live_queries.repeated_unsubscribes.load(Ordering::SeqCst)
    }

    /// Append attempts that reached the store, rejected ones included
    pub fn append_count(&self) -> usize {
        self.inner.appends.load(Ordering::SeqCst)
    }

    pub fn dm_channel_count(&self) -> usize {
        self.inner.dm_channels.len()
    }

    pub fn dm_record(&self, key: &DmKey) -> Option<DmRecord> {
        self.inner.dm_channels.get(key).map(|r| r.clone())
    }

    /// Every message stored under `path`, oldest first
    pub fn messages_at(&self, path: &StoragePath) -> Vec<Message> {
        self.inner
            .streams
            .get(path)
            .map(|stream| stream.all().to_vec())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("streams", &self.inner.streams.len())
            .field("dm_channels", &self.inner.dm_channels.len())
            .field("users", &self.inner.users.len())
            .field("groups", &self.inner.groups.len())
            .field("live_queries", &self.live_subscription_count())
            .finish()
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    #[instrument(skip(self, on_snapshot), fields(path = %path))]
    async fn subscribe(
        &self,
        path: &StoragePath,
        on_snapshot: SnapshotCallback,
    ) -> StoreResult<Box<dyn SubscriptionHandle>> {
        if self.inner.faults.reject_subscriptions.load(Ordering::SeqCst) {
            tracing::warn!("Subscription rejected");
            return Err(DomainError::SubscriptionRejected(path.to_string()));
        }

        // Guard is released before the task starts delivering
        let rx = self
            .inner
            .streams
            .entry(path.clone())
            .or_insert_with(MessageStream::new)
            .watch();

        let query = LiveQuery::spawn(
            path.clone(),
            rx,
            on_snapshot,
            Arc::clone(&self.inner.live_queries),
        );

        tracing::debug!("Live query started");
        Ok(Box::new(query))
    }

    #[instrument(skip(self, message), fields(path = %path, sender_id = %message.sender_id))]
    async fn append_message(
        &self,
        path: &StoragePath,
        message: &OutboundMessage,
    ) -> StoreResult<Message> {
        self.inner.appends.fetch_add(1, Ordering::SeqCst);

        if self.inner.faults.reject_appends.load(Ordering::SeqCst) {
            tracing::warn!("Append rejected");
            return Err(DomainError::StoreUnavailable("append rejected".to_string()));
        }

        let id = self.inner.ids.generate();
        let mut stream = self
            .inner
            .streams
            .entry(path.clone())
            .or_insert_with(MessageStream::new);

        let timestamp = stream.next_timestamp(Utc::now());
        let stored = Message::from_outbound(id, timestamp, message.clone());
        stream.push(stored.clone(), self.inner.history_limit);

        tracing::debug!(message_id = %id, "Message appended");
        Ok(stored)
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn delete_message(
        &self,
        path: &StoragePath,
        message_id: Snowflake,
        requester: Snowflake,
    ) -> StoreResult<()> {
        let mut stream = self
            .inner
            .streams
            .get_mut(path)
            .ok_or(DomainError::MessageNotFound(message_id))?;

        let index = stream
            .position(message_id)
            .ok_or(DomainError::MessageNotFound(message_id))?;

        if stream.get(index).is_some_and(|m| !m.is_from(requester)) {
            tracing::warn!("Delete refused for non-sender");
            return Err(DomainError::NotMessageSender);
        }

        stream.remove(index, self.inner.history_limit);
        tracing::debug!("Message deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn find_or_create_dm_storage_path(&self, key: &DmKey) -> StoreResult<StoragePath> {
        // The entry guard serializes racing creators on the same key
        let channel_id = match self.inner.dm_channels.entry(*key) {
            Entry::Occupied(existing) => existing.get().channel_id,
            Entry::Vacant(slot) => {
                let record = DmRecord {
                    channel_id: self.inner.ids.generate(),
                    participants: key.participants(),
                    created_at: Utc::now(),
                };
                let channel_id = record.channel_id;
                slot.insert(record);
                tracing::info!(dm_channel_id = %channel_id, "Direct message channel created");
                channel_id
            }
        };

        Ok(StoragePath::dm(channel_id))
    }

    async fn list_dm_channels(&self, user_id: Snowflake) -> StoreResult<Vec<DmKey>> {
        let mut keys: Vec<DmKey> = self
            .inner
            .dm_channels
            .iter()
            .filter(|entry| entry.key().includes(user_id))
            .map(|entry| *entry.key())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl DirectoryStore for InMemoryStore {
    async fn list_groups_for_user(&self, user_id: Snowflake) -> StoreResult<Vec<Group>> {
        let mut groups: Vec<Group> = self
            .inner
            .groups
            .iter()
            .filter(|entry| entry.has_member(user_id))
            .map(|entry| entry.value().clone())
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn list_users(&self) -> StoreResult<Vec<UserSummary>> {
        let mut users: Vec<UserSummary> = self
            .inner
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        users.sort_by(|a, b| a.display_name.cmp(&b.display_name).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn find_user(&self, user_id: Snowflake) -> StoreResult<Option<UserSummary>> {
        Ok(self.inner.users.get(&user_id).map(|u| u.clone()))
    }

    async fn find_group(&self, group_id: Snowflake) -> StoreResult<Option<Group>> {
        Ok(self.inner.groups.get(&group_id).map(|g| g.clone()))
    }
}
