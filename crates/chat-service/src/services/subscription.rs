//! Live subscription management
//!
//! At most one subscription is live at a time. Every switch advances a
//! generation counter before the old subscription is torn down; deliveries
//! tagged with an older generation are dropped, which covers batches that
//! were already in flight when the switch began.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chat_core::{Channel, ChannelId, Message, MessageStore, SnapshotCallback, StoragePath, SubscriptionHandle};
use tracing::{debug, info, instrument, warn};

use super::error::{ServiceError, ServiceResult};

/// Ordered snapshot of one channel, tagged with the generation it belongs to
#[derive(Debug, Clone)]
pub struct Batch {
    pub generation: u64,
    pub channel_id: ChannelId,
    pub messages: Vec<Message>,
}

/// Receiver of accepted batches. Runs on the store's delivery task.
pub type BatchHandler = Arc<dyn Fn(Batch) + Send + Sync>;

/// Description of the live subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub generation: u64,
    pub channel_id: ChannelId,
    pub storage_path: StoragePath,
}

struct LiveSubscription {
    info: Subscription,
    handle: Box<dyn SubscriptionHandle>,
}

/// Owner of the single live subscription
pub struct SubscriptionManager {
    store: Arc<dyn MessageStore>,
    generation: Arc<AtomicU64>,
    current: Option<LiveSubscription>,
}

impl SubscriptionManager {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self {
            store,
            generation: Arc::new(AtomicU64::new(0)),
            current: None,
        }
    }

    /// Start a switch: invalidate outstanding deliveries and tear down the
    /// live subscription. Returns the generation the next subscription must
    /// carry.
    pub fn begin_switch(&mut self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.teardown();
        generation
    }

    /// Subscribe to `channel` for `generation`, obtained from [`Self::begin_switch`].
    ///
    /// # Errors
    /// `Subscription` when the store refuses the live query; nothing is left
    /// live in that case. `Internal` when `generation` was superseded.
    #[instrument(skip(self, channel, on_batch), fields(channel_id = %channel.id))]
    pub async fn establish(
        &mut self,
        channel: &Channel,
        generation: u64,
        on_batch: BatchHandler,
    ) -> ServiceResult<Subscription> {
        if !self.is_current(generation) {
            return Err(ServiceError::internal(format!(
                "generation {generation} superseded by {}",
                self.generation()
            )));
        }

        let callback = guard_deliveries(
            channel.id.clone(),
            generation,
            Arc::clone(&self.generation),
            on_batch,
        );

        let handle = self
            .store
            .subscribe(&channel.storage_path, callback)
            .await
            .map_err(|e| {
                warn!(error = %e, "Subscription failed");
                ServiceError::Subscription(e)
            })?;

        let info = Subscription {
            generation,
            channel_id: channel.id.clone(),
            storage_path: channel.storage_path.clone(),
        };

        info!(
            generation,
            kind = channel.kind.label(),
            storage_path = %channel.storage_path,
            "Subscribed to channel"
        );

        self.current = Some(LiveSubscription {
            info: info.clone(),
            handle,
        });
        Ok(info)
    }

    /// Tear down the live subscription, then subscribe to `channel`
    ///
    /// # Errors
    /// See [`Self::establish`].
    pub async fn switch_to(&mut self, channel: &Channel, on_batch: BatchHandler) -> ServiceResult<Subscription> {
        let generation = self.begin_switch();
        self.establish(channel, generation, on_batch).await
    }

    /// Tear down without subscribing again. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.teardown();
    }

    pub fn current(&self) -> Option<&Subscription> {
        self.current.as_ref().map(|live| &live.info)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn teardown(&mut self) {
        // take() makes the unsubscribe happen exactly once
        if let Some(live) = self.current.take() {
            live.handle.unsubscribe();
            debug!(
                channel_id = %live.info.channel_id,
                generation = live.info.generation,
                "Subscription torn down"
            );
        }
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("generation", &self.generation())
            .field("current", &self.current())
            .finish()
    }
}

/// Wrap `on_batch` with the liveness and ordering checks
fn guard_deliveries(
    channel_id: ChannelId,
    generation: u64,
    live_generation: Arc<AtomicU64>,
    on_batch: BatchHandler,
) -> SnapshotCallback {
    Arc::new(move |mut messages: Vec<Message>| {
        let live = live_generation.load(Ordering::SeqCst);
        if live != generation {
            debug!(
                channel_id = %channel_id,
                generation,
                live,
                "Dropping stale batch"
            );
            return;
        }

        if !is_ordered(&messages) {
            warn!(
                channel_id = %channel_id,
                generation,
                "Batch out of timestamp order, sorting"
            );
            // stable: equal timestamps keep store order
            messages.sort_by_key(|m| m.timestamp);
        }

        on_batch(Batch {
            generation,
            channel_id: channel_id.clone(),
            messages,
        });
    })
}

fn is_ordered(messages: &[Message]) -> bool {
    messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
}
