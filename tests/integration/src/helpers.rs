//! Test helpers for integration tests
//!
//! Provides a shared store, and conversation views wired to a channel that
//! reports every applied batch.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chat_common::{MessagingConfig, StoreConfig};
use chat_core::Identity;
use chat_service::{ConversationViewModel, ScrollHint, ServiceContext};
use chat_store::InMemoryStore;
use tokio::sync::mpsc;

use crate::fixtures::Directory;

/// How long to wait for a batch before failing
pub const BATCH_TIMEOUT: Duration = Duration::from_secs(2);

/// One store plus the context every view shares
pub struct TestWorld {
    pub store: Arc<InMemoryStore>,
    pub ctx: ServiceContext,
    pub directory: Directory,
}

impl TestWorld {
    /// Start a world with default settings
    pub fn start() -> Self {
        Self::start_with_config(MessagingConfig::default(), StoreConfig::default())
    }

    /// Start a world with custom settings
    pub fn start_with_config(messaging: MessagingConfig, store_config: StoreConfig) -> Self {
        let store = Arc::new(InMemoryStore::new(&store_config));
        let directory = Directory::seed(&store);
        let ctx = ServiceContext::with_store(store.clone(), messaging);
        Self {
            store,
            ctx,
            directory,
        }
    }

    /// Conversation view for `identity`
    pub fn client(&self, identity: &Identity) -> TestClient {
        TestClient::new(self.ctx.clone(), identity.clone())
    }
}

/// Conversation view plus the batches it applied
pub struct TestClient {
    vm: ConversationViewModel,
    batches: mpsc::UnboundedReceiver<ScrollHint>,
}

impl TestClient {
    pub fn new(ctx: ServiceContext, identity: Identity) -> Self {
        let mut vm = ConversationViewModel::new(ctx, identity);
        let (tx, batches) = mpsc::unbounded_channel();
        vm.set_scroll_hook(move |hint| {
            let _ = tx.send(hint);
        });
        Self { vm, batches }
    }

    /// Next applied batch
    pub async fn next_batch(&mut self) -> Result<ScrollHint> {
        tokio::time::timeout(BATCH_TIMEOUT, self.batches.recv())
            .await
            .context("timed out waiting for a batch")?
            .context("scroll hook dropped")
    }

    /// Wait until a batch of exactly `count` messages has been applied
    pub async fn wait_for_count(&mut self, count: usize) -> Result<ScrollHint> {
        loop {
            let hint = self.next_batch().await?;
            if hint.message_count == count {
                return Ok(hint);
            }
        }
    }

    /// Batches applied so far that nobody has looked at
    pub fn drain_batches(&mut self) -> Vec<ScrollHint> {
        let mut hints = Vec::new();
        while let Ok(hint) = self.batches.try_recv() {
            hints.push(hint);
        }
        hints
    }
}

impl Deref for TestClient {
    type Target = ConversationViewModel;

    fn deref(&self) -> &Self::Target {
        &self.vm
    }
}

impl DerefMut for TestClient {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.vm
    }
}

/// Let spawned delivery tasks run
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
