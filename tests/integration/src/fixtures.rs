//! Test fixtures and data generators
//!
//! Provides a small, reusable directory: three users and two groups.

use std::sync::atomic::{AtomicU64, Ordering};

use chat_core::{Group, Identity, OutboundMessage, Snowflake, UserSummary};
use chat_store::InMemoryStore;
use chrono::Utc;

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Seeded users and groups
#[derive(Debug, Clone)]
pub struct Directory {
    pub ada: Identity,
    pub bob: Identity,
    pub carol: Identity,
    /// Ada (owner), Bob, Carol
    pub team: Group,
    /// Bob (owner), Ada
    pub pair: Group,
}

impl Directory {
    /// Seed `store` with the fixture directory. Ids come from the store's
    /// generator, so several directories can share one store.
    pub fn seed(store: &InMemoryStore) -> Self {
        let suffix = unique_suffix();
        let ada = Identity::new(store.next_id(), format!("Ada{suffix}"));
        let bob = Identity::new(store.next_id(), format!("Bob{suffix}"));
        let carol = Identity::new(store.next_id(), format!("Carol{suffix}"));

        store.add_user(UserSummary::new(ada.id, ada.display_name.clone()).with_last_login(Utc::now()));
        store.add_user(UserSummary::new(bob.id, bob.display_name.clone()).with_last_login(Utc::now()));
        store.add_user(UserSummary::new(carol.id, carol.display_name.clone()));

        let team = Group::new(store.next_id(), format!("team{suffix}"), ada.id)
            .with_members([bob.id, carol.id]);
        let pair = Group::new(store.next_id(), format!("pair{suffix}"), bob.id).with_members([ada.id]);
        store.add_group(team.clone());
        store.add_group(pair.clone());

        Self {
            ada,
            bob,
            carol,
            team,
            pair,
        }
    }
}

/// Outbound message written straight to the store, bypassing a view
pub fn outbound(sender: &Identity, text: &str) -> OutboundMessage {
    OutboundMessage {
        sender_id: sender.id,
        sender_name: sender.display_name.clone(),
        text: text.to_string(),
        reply_to: None,
    }
}

/// Id that no fixture user has
pub fn unknown_user() -> Snowflake {
    Snowflake::new(i64::MAX)
}
