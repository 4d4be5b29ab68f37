//! Storage paths - the hierarchical location of a channel's message stream.
//!
//! Every channel kind has its own root so public, group, and DM streams never
//! collide:
//!
//! - `channels/{name}/messages`
//! - `groups/{group_id}/messages`
//! - `dms/{dm_channel_id}/messages`

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Snowflake;
use crate::error::DomainError;

/// Root segment for public channels
pub const PUBLIC_ROOT: &str = "channels";
/// Root segment for private group channels
pub const GROUP_ROOT: &str = "groups";
/// Root segment for direct-message channels
pub const DM_ROOT: &str = "dms";
/// Leaf collection holding the messages
pub const MESSAGES_LEAF: &str = "messages";

/// Which stream a path points at
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageScope {
    Public(String),
    Group(Snowflake),
    Dm(Snowflake),
}

/// Path of a channel's message collection in the document store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoragePath(String);

impl StoragePath {
    #[must_use]
    pub fn public(name: &str) -> Self {
        Self(format!("{PUBLIC_ROOT}/{name}/{MESSAGES_LEAF}"))
    }

    #[must_use]
    pub fn group(group_id: Snowflake) -> Self {
        Self(format!("{GROUP_ROOT}/{group_id}/{MESSAGES_LEAF}"))
    }

    #[must_use]
    pub fn dm(dm_channel_id: Snowflake) -> Self {
        Self(format!("{DM_ROOT}/{dm_channel_id}/{MESSAGES_LEAF}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a raw path back into a scope.
    ///
    /// # Errors
    /// `InvalidStoragePath` if the path does not have the
    /// `{root}/{id}/messages` shape or the root is unknown.
    pub fn parse(raw: &str) -> Result<(Self, StorageScope), DomainError> {
        let invalid = || DomainError::InvalidStoragePath(raw.to_string());

        let mut segments = raw.split('/');
        let (Some(root), Some(id), Some(MESSAGES_LEAF), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(invalid());
        };

        if id.is_empty() {
            return Err(invalid());
        }

        let scope = match root {
            PUBLIC_ROOT => StorageScope::Public(id.to_string()),
            GROUP_ROOT => StorageScope::Group(Snowflake::parse(id).map_err(|_| invalid())?),
            DM_ROOT => StorageScope::Dm(Snowflake::parse(id).map_err(|_| invalid())?),
            _ => return Err(invalid()),
        };

        Ok((Self(raw.to_string()), scope))
    }

    /// Scope this path points at
    #[must_use]
    pub fn scope(&self) -> Option<StorageScope> {
        Self::parse(&self.0).ok().map(|(_, scope)| scope)
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
