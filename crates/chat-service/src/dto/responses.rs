//! Response DTOs - what the presentation layer renders

use chat_core::{ChannelId, DmKey, Group, Message, PresenceHint, Snowflake, UserSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;

// ============================================================================
// Conversation
// ============================================================================

/// Lifecycle of a conversation view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    /// No channel selected
    #[default]
    Idle,
    /// Old subscription torn down, new one pending
    Switching,
    /// Subscribed and receiving batches
    Live,
}

/// One rendered message with its derived layout flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRow {
    pub message: Message,
    /// Sender name and time shown above this message
    pub show_header: bool,
    /// Sent by the identity driving the view
    pub is_mine: bool,
}

/// Pending reply quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyContext {
    pub channel_id: ChannelId,
    pub message: Message,
}

/// Signal emitted after every applied batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrollHint {
    pub channel_id: ChannelId,
    pub generation: u64,
    pub message_count: usize,
}

/// User-visible, non-fatal error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub message: String,
}

// ============================================================================
// Directory
// ============================================================================

/// Group the user belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupEntry {
    pub id: Snowflake,
    pub name: String,
    pub member_count: usize,
    pub is_owner: bool,
}

impl GroupEntry {
    pub fn from_group(group: &Group, viewer: Snowflake) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
            member_count: group.member_ids.len(),
            is_owner: group.is_owner(viewer),
        }
    }
}

/// Existing direct message channel with its counterpart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DmEntry {
    pub channel_id: ChannelId,
    pub counterpart_id: Snowflake,
    pub counterpart_name: String,
}

impl DmEntry {
    pub fn new(key: DmKey, counterpart: &UserSummary) -> Self {
        Self {
            channel_id: key.into(),
            counterpart_id: counterpart.id,
            counterpart_name: counterpart.display_name.clone(),
        }
    }
}

/// User sharing at least one group with the viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoworkerEntry {
    pub id: Snowflake,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    /// Display hint only, derived from `last_login`
    pub presence: PresenceHint,
}

impl CoworkerEntry {
    pub fn new(user: &UserSummary, presence: PresenceHint) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name.clone(),
            last_login: user.last_login,
            presence,
        }
    }
}

/// Everything the channel picker shows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectorySnapshot {
    pub public_channels: Vec<String>,
    pub groups: Vec<GroupEntry>,
    pub direct_messages: Vec<DmEntry>,
    pub coworkers: Vec<CoworkerEntry>,
}

impl DirectorySnapshot {
    /// Coworkers without an existing direct message channel
    pub fn dm_candidates(&self) -> Vec<CoworkerEntry> {
        self.coworkers
            .iter()
            .filter(|c| {
                !self
                    .direct_messages
                    .iter()
                    .any(|dm| dm.counterpart_id == c.id)
            })
            .cloned()
            .collect()
    }
}
