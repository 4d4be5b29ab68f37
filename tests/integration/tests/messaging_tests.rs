//! Messaging integration tests
//!
//! Drive conversation views end to end against the in-memory store.
//!
//! Run with: cargo test -p integration-tests --test messaging_tests

use chat_common::{MessagingConfig, StoreConfig};
use chat_core::{DomainError, MessageStore, StoragePath};
use chat_service::{
    ChannelAddressResolver, ChannelIntent, ConversationPhase, DirectoryIndex, ServiceError,
};
use integration_tests::{fixtures::*, settle, TestWorld};

// ============================================================================
// Example Scenario
// ============================================================================

#[tokio::test]
async fn test_general_then_dm_scenario() {
    let world = TestWorld::start();
    let dir = &world.directory;
    let mut ada = world.client(&dir.ada);
    let mut bob = world.client(&dir.bob);

    // Live with empty history
    ada.open(ChannelIntent::public("general")).await.unwrap();
    assert_eq!(ada.phase(), ConversationPhase::Live);
    ada.wait_for_count(0).await.unwrap();

    ada.set_draft("hi");
    ada.send_draft().await.unwrap();
    ada.wait_for_count(1).await.unwrap();
    let rows = ada.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].message.text, "hi");
    assert!(rows[0].is_mine);
    assert!(rows[0].show_header);

    // First resolution creates the DM channel
    let dm = ada.open(ChannelIntent::direct(dir.bob.id)).await.unwrap();
    assert_eq!(world.store.dm_channel_count(), 1);
    assert_eq!(world.store.live_subscription_count(), 1);
    let hint = ada.wait_for_count(0).await.unwrap();
    assert_eq!(hint.channel_id, dm.id);

    // Second resolution, from the other side, reuses it
    let same = bob.open(ChannelIntent::direct(dir.ada.id)).await.unwrap();
    assert_eq!(same.id, dm.id);
    assert_eq!(same.storage_path, dm.storage_path);
    assert_eq!(world.store.dm_channel_count(), 1);

    // Traffic in #general no longer reaches Ada's view
    world
        .store
        .append_message(&StoragePath::public("general"), &outbound(&dir.carol, "still here?"))
        .await
        .unwrap();
    settle().await;
    for hint in ada.drain_batches() {
        assert_eq!(hint.channel_id, dm.id);
    }
    assert!(ada.messages().is_empty());

    bob.set_draft("hello Ada");
    bob.send_draft().await.unwrap();
    ada.wait_for_count(1).await.unwrap();
    assert_eq!(ada.messages()[0].text, "hello Ada");
    assert!(!ada.rows()[0].is_mine);
}

// ============================================================================
// DM Canonicalization
// ============================================================================

#[tokio::test]
async fn test_dm_resolution_is_commutative_and_idempotent() {
    let world = TestWorld::start();
    let dir = &world.directory;
    let resolver = ChannelAddressResolver::new(&world.ctx);

    let pairs = [(&dir.ada, &dir.bob), (&dir.ada, &dir.carol), (&dir.bob, &dir.carol)];
    for (a, b) in pairs {
        let forward = resolver.resolve_or_create_dm(a.id, b.id).await.unwrap();
        let backward = resolver.resolve_or_create_dm(b.id, a.id).await.unwrap();
        let again = resolver.resolve_or_create_dm(a.id, b.id).await.unwrap();
        assert_eq!(forward.id, backward.id);
        assert_eq!(forward.id, again.id);
        assert_eq!(forward.storage_path, backward.storage_path);
    }
    assert_eq!(world.store.dm_channel_count(), 3);
}

#[tokio::test]
async fn test_concurrent_dm_from_both_sides() {
    let world = TestWorld::start();
    let dir = world.directory.clone();

    let attempts = (0..8).map(|i| {
        let ctx = world.ctx.clone();
        let (me, other) = if i % 2 == 0 {
            (dir.ada.id, dir.bob.id)
        } else {
            (dir.bob.id, dir.ada.id)
        };
        tokio::spawn(async move {
            ChannelAddressResolver::new(&ctx)
                .resolve_or_create_dm(me, other)
                .await
                .map(|channel| (channel.id, channel.storage_path))
        })
    });

    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(world.store.dm_channel_count(), 1);
}

#[tokio::test]
async fn test_self_and_unknown_dm_rejected() {
    let world = TestWorld::start();
    let dir = &world.directory;
    let mut ada = world.client(&dir.ada);

    let err = ada.open(ChannelIntent::direct(dir.ada.id)).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::AddressResolution(DomainError::SelfDirectMessage)
    ));
    assert_eq!(ada.phase(), ConversationPhase::Idle);

    let err = ada.open(ChannelIntent::direct(unknown_user())).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::AddressResolution(DomainError::UserNotFound(_))
    ));
    assert_eq!(ada.phase(), ConversationPhase::Idle);
    assert_eq!(world.store.dm_channel_count(), 0);
}

// ============================================================================
// Subscriptions
// ============================================================================

#[tokio::test]
async fn test_single_subscription_across_switches() {
    let world = TestWorld::start();
    let dir = &world.directory;
    let mut ada = world.client(&dir.ada);

    let intents = [
        ChannelIntent::public("general"),
        ChannelIntent::group(dir.team.id, ""),
        ChannelIntent::direct(dir.bob.id),
        ChannelIntent::public("random"),
        ChannelIntent::group(dir.pair.id, "Pairing"),
    ];
    for intent in intents {
        ada.open(intent).await.unwrap();
        assert_eq!(world.store.live_subscription_count(), 1);
    }

    // one teardown per switch, none twice
    assert_eq!(world.store.unsubscribe_call_count(), 4);

    ada.close();
    assert_eq!(world.store.live_subscription_count(), 0);
    assert_eq!(world.store.unsubscribe_call_count(), 5);
    assert_eq!(world.store.repeated_unsubscribe_count(), 0);
}

#[tokio::test]
async fn test_group_display_name_lookup() {
    let world = TestWorld::start();
    let dir = &world.directory;
    let mut ada = world.client(&dir.ada);

    let channel = ada.open(ChannelIntent::group(dir.team.id, "")).await.unwrap();
    assert_eq!(channel.display_name, dir.team.name);
    assert!(channel.is_group());
}

#[tokio::test]
async fn test_stale_batches_after_rapid_switching() {
    let world = TestWorld::start();
    let dir = &world.directory;
    let mut ada = world.client(&dir.ada);
    let general = StoragePath::public("general");

    for _ in 0..5 {
        world
            .store
            .append_message(&general, &outbound(&dir.bob, "noise"))
            .await
            .unwrap();
    }

    // switch away before #general's first snapshot can be observed
    ada.open(ChannelIntent::public("general")).await.unwrap();
    ada.open(ChannelIntent::public("help")).await.unwrap();
    for _ in 0..5 {
        world
            .store
            .append_message(&general, &outbound(&dir.bob, "more noise"))
            .await
            .unwrap();
    }
    settle().await;

    let generation = ada.generation();
    for hint in ada.drain_batches() {
        // anything tagged with the earlier generation must never be applied
        if hint.generation != generation {
            assert_eq!(hint.channel_id.as_str(), "general");
        }
    }
    assert!(ada.messages().is_empty());
    assert_eq!(ada.active_channel().unwrap().id.as_str(), "help");
}

#[tokio::test]
async fn test_subscription_failure_surfaces_notice() {
    let world = TestWorld::start();
    let mut ada = world.client(&world.directory.ada);
    ada.open(ChannelIntent::public("general")).await.unwrap();

    world.store.reject_subscriptions(true);
    let err = ada.open(ChannelIntent::public("random")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Subscription(_)));
    assert_eq!(ada.phase(), ConversationPhase::Idle);
    assert_eq!(world.store.live_subscription_count(), 0);
    assert_eq!(ada.last_notice().unwrap().code, "SUBSCRIPTION_FAILED");

    world.store.reject_subscriptions(false);
    ada.open(ChannelIntent::public("random")).await.unwrap();
    assert_eq!(ada.phase(), ConversationPhase::Live);
    assert!(ada.last_notice().is_none());
}

// ============================================================================
// Composing
// ============================================================================

#[tokio::test]
async fn test_empty_send_never_appends() {
    let world = TestWorld::start();
    let mut ada = world.client(&world.directory.ada);
    ada.open(ChannelIntent::public("general")).await.unwrap();

    for draft in ["", "   ", "\n"] {
        ada.set_draft(draft);
        let err = ada.send_draft().await.unwrap_err();
        assert!(err.is_silent());
    }
    assert_eq!(world.store.append_count(), 0);
    assert!(ada.last_notice().is_none());
}

#[tokio::test]
async fn test_send_failure_keeps_draft() {
    let world = TestWorld::start();
    let mut ada = world.client(&world.directory.ada);
    ada.open(ChannelIntent::public("general")).await.unwrap();

    world.store.reject_appends(true);
    ada.set_draft("important");
    let err = ada.send_draft().await.unwrap_err();
    assert!(matches!(err, ServiceError::Send(_)));
    assert_eq!(ada.draft(), "important");
    assert!(ada.last_notice().is_some());

    // manual retry; nothing was retried automatically
    assert_eq!(world.store.append_count(), 1);
    world.store.reject_appends(false);
    ada.send_draft().await.unwrap();
    assert_eq!(world.store.append_count(), 2);
    assert_eq!(ada.draft(), "");
}

#[tokio::test]
async fn test_long_message_rejected() {
    let messaging = MessagingConfig {
        max_message_length: 5,
        ..MessagingConfig::default()
    };
    let world = TestWorld::start_with_config(messaging, StoreConfig::default());
    let mut ada = world.client(&world.directory.ada);
    ada.open(ChannelIntent::public("general")).await.unwrap();

    ada.set_draft("too long");
    let err = ada.send_draft().await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(world.store.append_count(), 0);
}

#[tokio::test]
async fn test_reply_snapshot_survives_deletion() {
    let world = TestWorld::start();
    let dir = &world.directory;
    let mut ada = world.client(&dir.ada);
    let mut bob = world.client(&dir.bob);

    ada.open(ChannelIntent::direct(dir.bob.id)).await.unwrap();
    bob.open(ChannelIntent::direct(dir.ada.id)).await.unwrap();

    bob.set_draft("original words");
    let original = bob.send_draft().await.unwrap();
    ada.wait_for_count(1).await.unwrap();

    ada.start_reply(original.id).unwrap();
    ada.set_draft("quoting you");
    ada.send_draft().await.unwrap();
    bob.wait_for_count(2).await.unwrap();

    bob.delete_message(original.id).await.unwrap();
    ada.wait_for_count(1).await.unwrap();

    let remaining = ada.messages();
    let quote = remaining[0].reply_to.as_ref().unwrap();
    assert_eq!(quote.message_id, original.id);
    assert_eq!(quote.text, "original words");
    assert_eq!(quote.sender_name, dir.bob.display_name);
}

#[tokio::test]
async fn test_reply_does_not_leak_across_channels() {
    let world = TestWorld::start();
    let mut ada = world.client(&world.directory.ada);
    ada.open(ChannelIntent::public("general")).await.unwrap();
    ada.set_draft("quote me");
    let sent = ada.send_draft().await.unwrap();
    ada.wait_for_count(1).await.unwrap();
    ada.start_reply(sent.id).unwrap();

    ada.open(ChannelIntent::public("random")).await.unwrap();
    assert!(ada.reply_context().is_none());

    ada.set_draft("fresh");
    let plain = ada.send_draft().await.unwrap();
    assert!(plain.reply_to.is_none());
}

// ============================================================================
// Deletion
// ============================================================================

#[tokio::test]
async fn test_only_sender_may_delete() {
    let world = TestWorld::start();
    let dir = &world.directory;
    let mut ada = world.client(&dir.ada);
    let mut bob = world.client(&dir.bob);

    ada.open(ChannelIntent::public("general")).await.unwrap();
    bob.open(ChannelIntent::public("general")).await.unwrap();
    ada.set_draft("ada's message");
    let sent = ada.send_draft().await.unwrap();
    bob.wait_for_count(1).await.unwrap();

    let err = bob.delete_message(sent.id).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Delete(DomainError::NotMessageSender)
    ));
    assert_eq!(bob.messages().len(), 1);

    // the store refuses too, even without the client-side check
    let err = world
        .store
        .delete_message(&StoragePath::public("general"), sent.id, dir.bob.id)
        .await
        .unwrap_err();
    assert!(err.is_authorization());

    ada.wait_for_count(1).await.unwrap();
    ada.delete_message(sent.id).await.unwrap();
    assert!(ada.messages().is_empty());
    bob.wait_for_count(0).await.unwrap();
}

// ============================================================================
// Directory
// ============================================================================

#[tokio::test]
async fn test_directory_for_user() {
    let world = TestWorld::start();
    let dir = &world.directory;
    let index = DirectoryIndex::new(&world.ctx);

    ChannelAddressResolver::new(&world.ctx)
        .resolve_or_create_dm(dir.ada.id, dir.carol.id)
        .await
        .unwrap();

    let snapshot = index.load(&dir.ada).await.unwrap();
    assert_eq!(snapshot.groups.len(), 2);

    let coworkers: Vec<_> = snapshot.coworkers.iter().map(|c| c.id).collect();
    assert_eq!(coworkers, vec![dir.bob.id, dir.carol.id]);

    assert_eq!(snapshot.direct_messages.len(), 1);
    assert_eq!(snapshot.direct_messages[0].counterpart_id, dir.carol.id);

    let candidates = index.dm_candidates(&dir.ada).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, dir.bob.id);

    // Carol only shares the team group with Ada and Bob
    let carol_view = index.load(&dir.carol).await.unwrap();
    assert_eq!(carol_view.groups.len(), 1);
    assert_eq!(carol_view.coworkers.len(), 2);
}
