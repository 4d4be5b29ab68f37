//! Traits implemented by infrastructure

mod store;

pub use store::{
    DirectoryStore, MessageStore, SnapshotCallback, StoreResult, SubscriptionHandle,
};
