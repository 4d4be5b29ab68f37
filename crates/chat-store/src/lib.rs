//! # chat-store
//!
//! In-memory document store implementing the message and directory ports
//! from `chat-core`. Live queries push full snapshots of a stream's newest
//! messages whenever the stream changes.

mod memory;
mod stream;

pub use memory::{DmRecord, InMemoryStore};
pub use stream::LiveQuery;
