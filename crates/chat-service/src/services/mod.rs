//! Messaging services
//!
//! Resolution, subscription, composition, the conversation view model and
//! the directory index. Short-lived services borrow a [`ServiceContext`];
//! the view model owns one.

pub mod composer;
pub mod context;
pub mod conversation;
pub mod directory;
pub mod error;
pub mod grouping;
pub mod resolver;
pub mod subscription;

// Re-export all services for convenience
pub use composer::MessageComposer;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use conversation::{ConversationViewModel, ScrollHook};
pub use directory::DirectoryIndex;
pub use error::{ServiceError, ServiceResult};
pub use grouping::{group_rows, header_flags};
pub use resolver::ChannelAddressResolver;
pub use subscription::{Batch, BatchHandler, Subscription, SubscriptionManager};
