//! # chat-service
//!
//! Messaging core: channel resolution, live subscriptions, composition, the
//! conversation view model and the directory index, plus their DTOs.

pub mod dto;
pub mod services;

pub use dto::{
    ChannelIntent, ConversationPhase, CoworkerEntry, DirectorySnapshot, DmEntry, GroupEntry,
    MessageRow, Notice, ReplyContext, ScrollHint, SendMessageRequest,
};
pub use services::{
    ChannelAddressResolver, ConversationViewModel, DirectoryIndex, MessageComposer, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult, SubscriptionManager,
};
