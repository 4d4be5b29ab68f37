//! Message streams and live queries.
//!
//! Each storage path owns one stream. Writers publish the latest window of
//! messages into a `watch` channel; every live query runs a small task that
//! forwards each new snapshot to its callback. `watch` keeps only the newest
//! value, which matches the full-snapshot delivery contract: a slow consumer
//! skips intermediate states instead of queueing them.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chat_core::{Message, SnapshotCallback, StoragePath, SubscriptionHandle};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::AbortHandle;

/// Messages of one storage path plus the channel that publishes snapshots
pub(crate) struct MessageStream {
    messages: Vec<Message>,
    snapshots: watch::Sender<Vec<Message>>,
}

impl MessageStream {
    pub(crate) fn new() -> Self {
        let (snapshots, _) = watch::channel(Vec::new());
        Self {
            messages: Vec::new(),
            snapshots,
        }
    }

    /// Timestamp for the next append: never earlier than the newest message,
    /// so per-stream order stays non-decreasing under clock skew.
    pub(crate) fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.messages
            .last()
            .map_or(now, |last| now.max(last.timestamp))
    }

    pub(crate) fn push(&mut self, message: Message, window: usize) {
        self.messages.push(message);
        self.publish(window);
    }

    pub(crate) fn position(&self, message_id: chat_core::Snowflake) -> Option<usize> {
        self.messages.iter().position(|m| m.id == message_id)
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub(crate) fn remove(&mut self, index: usize, window: usize) -> Message {
        let removed = self.messages.remove(index);
        self.publish(window);
        removed
    }

    pub(crate) fn all(&self) -> &[Message] {
        &self.messages
    }

    pub(crate) fn watch(&self) -> watch::Receiver<Vec<Message>> {
        self.snapshots.subscribe()
    }

    /// Current window, oldest first
    pub(crate) fn window(&self, window: usize) -> Vec<Message> {
        let start = self.messages.len().saturating_sub(window);
        self.messages[start..].to_vec()
    }

    fn publish(&self, window: usize) {
        // send_replace stores the value even when nobody is watching
        self.snapshots.send_replace(self.window(window));
    }
}

/// Counters shared between the store and its live queries
#[derive(Debug, Default)]
pub(crate) struct LiveQueryStats {
    pub(crate) live: AtomicUsize,
    pub(crate) unsubscribe_calls: AtomicUsize,
    /// `unsubscribe` calls on a handle that was already closed
    pub(crate) repeated_unsubscribes: AtomicUsize,
}

/// Handle of a running live query
pub struct LiveQuery {
    path: StoragePath,
    task: AbortHandle,
    closed: AtomicBool,
    stats: Arc<LiveQueryStats>,
}

impl LiveQuery {
    /// Spawn the forwarding task for `rx`
    pub(crate) fn spawn(
        path: StoragePath,
        mut rx: watch::Receiver<Vec<Message>>,
        on_snapshot: SnapshotCallback,
        stats: Arc<LiveQueryStats>,
    ) -> Self {
        let task_path = path.clone();
        let task = tokio::spawn(async move {
            loop {
                let snapshot = rx.borrow_and_update().clone();
                tracing::trace!(path = %task_path, count = snapshot.len(), "Delivering snapshot");
                on_snapshot(snapshot);

                if rx.changed().await.is_err() {
                    tracing::debug!(path = %task_path, "Stream closed");
                    break;
                }
            }
        })
        .abort_handle();

        stats.live.fetch_add(1, Ordering::SeqCst);

        Self {
            path,
            task,
            closed: AtomicBool::new(false),
            stats,
        }
    }
}

impl SubscriptionHandle for LiveQuery {
    fn unsubscribe(&self) {
        self.stats.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);

        if self.closed.swap(true, Ordering::SeqCst) {
            self.stats.repeated_unsubscribes.fetch_add(1, Ordering::SeqCst);
            tracing::warn!(path = %self.path, "Live query unsubscribed twice");
            return;
        }

        self.task.abort();
        self.stats.live.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!(path = %self.path, "Live query stopped");
    }
}
