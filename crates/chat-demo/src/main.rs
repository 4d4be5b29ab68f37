//! Conversation walkthrough against the in-memory store
//!
//! Run with:
//! ```bash
//! cargo run -p chat-demo
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use chat_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use chat_core::{Group, Identity, UserSummary};
use chat_service::{
    ChannelIntent, ConversationViewModel, DirectoryIndex, ScrollHint, ServiceContext,
};
use chat_store::InMemoryStore;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const BATCH_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: invalid configuration ({e}), using defaults");
            AppConfig::default()
        }
    };

    let tracing_config = TracingConfig::for_environment(config.app.env, &config.logging);
    if let Err(e) = try_init_tracing_with_config(&tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "Demo failed");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!(app = %config.app.name, env = ?config.app.env, "Starting demo");

    let store = Arc::new(InMemoryStore::new(&config.store));
    let ctx = ServiceContext::with_store(store.clone(), config.messaging.clone());

    let ada = Identity::new(store.next_id(), "Ada");
    let bob = Identity::new(store.next_id(), "Bob");
    seed(&store, &ada, &bob);

    let (mut ada_view, mut ada_batches) = view(&ctx, ada.clone());
    let (mut bob_view, mut bob_batches) = view(&ctx, bob.clone());

    // Ada opens #general and says hi
    ada_view.open(ChannelIntent::public("general")).await?;
    await_count(&mut ada_batches, 0).await?;

    ada_view.set_draft("hi");
    ada_view.send_draft().await?;
    await_count(&mut ada_batches, 1).await?;
    log_rows("ada", &ada_view);

    // Ada switches to a DM with Bob; the channel is created on first use
    let from_ada = ada_view.open(ChannelIntent::direct(bob.id)).await?;
    await_count(&mut ada_batches, 0).await?;
    info!(channel_id = %from_ada.id, storage_path = %from_ada.storage_path, "Ada opened DM");

    // Bob opens the same conversation from his side
    let from_bob = bob_view.open(ChannelIntent::direct(ada.id)).await?;
    await_count(&mut bob_batches, 0).await?;
    if from_bob.id != from_ada.id || from_bob.storage_path != from_ada.storage_path {
        bail!("DM resolved to different channels: {} vs {}", from_ada.id, from_bob.id);
    }
    info!(dm_channels = store.dm_channel_count(), "Both sides share one DM channel");

    bob_view.set_draft("hey Ada, did you see the deploy?");
    let question = bob_view.send_draft().await?;
    await_count(&mut ada_batches, 1).await?;

    ada_view.start_reply(question.id)?;
    ada_view.set_draft("yes, looks good");
    ada_view.send_draft().await?;
    await_count(&mut bob_batches, 2).await?;

    // The quote is a snapshot: deleting the original leaves it intact
    bob_view.delete_message(question.id).await?;
    await_count(&mut ada_batches, 1).await?;
    log_rows("ada", &ada_view);

    // A blank draft never reaches the store
    let appends = store.append_count();
    ada_view.set_draft("   ");
    if let Err(e) = ada_view.send_draft().await {
        info!(code = e.error_code(), silent = e.is_silent(), "Blank draft rejected");
    }
    if store.append_count() != appends {
        warn!("Blank draft reached the store");
    }

    let directory = DirectoryIndex::new(&ctx).load(&ada).await?;
    info!(
        public_channels = ?directory.public_channels,
        groups = directory.groups.len(),
        direct_messages = directory.direct_messages.len(),
        coworkers = directory.coworkers.len(),
        "Ada's directory"
    );
    for coworker in &directory.coworkers {
        info!(name = %coworker.display_name, presence = ?coworker.presence, "Coworker");
    }

    ada_view.close();
    bob_view.close();
    info!(live_subscriptions = store.live_subscription_count(), "Demo finished");

    Ok(())
}

fn seed(store: &InMemoryStore, ada: &Identity, bob: &Identity) {
    let now = Utc::now();
    store.add_user(UserSummary::new(ada.id, ada.display_name.clone()).with_last_login(now));
    store.add_user(UserSummary::new(bob.id, bob.display_name.clone()));

    let carol = store.next_id();
    store.add_user(UserSummary::new(carol, "Carol").with_last_login(now));

    let team = Group::new(store.next_id(), "platform".to_string(), ada.id).with_members([bob.id, carol]);
    store.add_group(team);
}

fn view(ctx: &ServiceContext, identity: Identity) -> (ConversationViewModel, mpsc::UnboundedReceiver<ScrollHint>) {
    let mut vm = ConversationViewModel::new(ctx.clone(), identity);
    let (tx, rx) = mpsc::unbounded_channel();
    vm.set_scroll_hook(move |hint| {
        let _ = tx.send(hint);
    });
    (vm, rx)
}

/// Wait until a batch with `count` messages has been applied
async fn await_count(rx: &mut mpsc::UnboundedReceiver<ScrollHint>, count: usize) -> anyhow::Result<()> {
    loop {
        let hint = tokio::time::timeout(BATCH_TIMEOUT, rx.recv())
            .await
            .context("timed out waiting for a batch")?
            .context("view model dropped its scroll hook")?;
        if hint.message_count == count {
            return Ok(());
        }
    }
}

fn log_rows(who: &str, vm: &ConversationViewModel) {
    for row in vm.rows() {
        let quote = row
            .message
            .reply_to
            .as_ref()
            .map(|r| format!("{}: {}", r.sender_name, r.preview(40)));
        info!(
            view = who,
            header = row.show_header,
            mine = row.is_mine,
            sender = %row.message.sender_name,
            text = %row.message.text,
            quote = ?quote,
            "Row"
        );
    }
}
