//! Domain entities - core messaging objects

mod channel;
mod group;
mod message;
mod user;

pub use channel::{Channel, ChannelId, ChannelKind};
pub use group::Group;
pub use message::{Message, OutboundMessage, ReplySnapshot};
pub use user::{Identity, PresenceHint, UserSummary};
