//! Channel entity - a public channel, private group channel, or DM

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value_objects::{DmKey, Snowflake, StoragePath};

/// Channel identity: public channel name, group id, or canonical DM key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DmKey> for ChannelId {
    fn from(key: DmKey) -> Self {
        Self(key.to_string())
    }
}

/// Channel kind, carrying what each kind is addressed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelKind {
    /// Broadcast channel everyone can read
    Public,
    /// Private group channel
    Group { group_id: Snowflake },
    /// Direct message between two users
    Dm { key: DmKey },
}

impl ChannelKind {
    /// Short label for logs
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Group { .. } => "group",
            Self::Dm { .. } => "dm",
        }
    }
}

/// A fully resolved channel. The storage path is computed once at resolution
/// time and never rebuilt from the kind at call sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub kind: ChannelKind,
    pub display_name: String,
    pub storage_path: StoragePath,
}

impl Channel {
    /// Public channel, addressed by its name
    #[must_use]
    pub fn public(name: &str) -> Self {
        Self {
            id: ChannelId::new(name),
            kind: ChannelKind::Public,
            display_name: name.to_string(),
            storage_path: StoragePath::public(name),
        }
    }

    /// Private group channel
    #[must_use]
    pub fn group(group_id: Snowflake, display_name: String) -> Self {
        Self {
            id: ChannelId::new(group_id.to_string()),
            kind: ChannelKind::Group { group_id },
            display_name,
            storage_path: StoragePath::group(group_id),
        }
    }

    /// DM channel. `storage_path` comes from the store's find-or-create
    /// primitive, `display_name` is the counterpart's name.
    #[must_use]
    pub fn dm(key: DmKey, display_name: String, storage_path: StoragePath) -> Self {
        Self {
            id: ChannelId::from(key),
            kind: ChannelKind::Dm { key },
            display_name,
            storage_path,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_dm(&self) -> bool {
        matches!(self.kind, ChannelKind::Dm { .. })
    }

    #[inline]
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.kind, ChannelKind::Group { .. })
    }
}
