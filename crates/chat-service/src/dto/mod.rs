//! Data transfer objects
//!
//! This module provides:
//! - Request DTOs: channel intents and the validated send request
//! - Response DTOs: rows, notices and directory entries for rendering

pub mod requests;
pub mod responses;

pub use requests::{ChannelIntent, SendMessageRequest};

pub use responses::{
    ConversationPhase, CoworkerEntry, DirectorySnapshot, DmEntry, GroupEntry, MessageRow, Notice,
    ReplyContext, ScrollHint,
};
