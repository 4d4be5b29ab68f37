//! Group entity - a private channel's membership record

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::value_objects::Snowflake;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Snowflake,
    pub name: String,
    pub owner_id: Snowflake,
    pub member_ids: BTreeSet<Snowflake>,
}

impl Group {
    /// Create a group whose only member is its owner
    pub fn new(id: Snowflake, name: String, owner_id: Snowflake) -> Self {
        Self {
            id,
            name,
            owner_id,
            member_ids: BTreeSet::from([owner_id]),
        }
    }

    /// Builder-style member addition
    #[must_use]
    pub fn with_members(mut self, members: impl IntoIterator<Item = Snowflake>) -> Self {
        self.member_ids.extend(members);
        self
    }

    #[inline]
    pub fn has_member(&self, user_id: Snowflake) -> bool {
        self.member_ids.contains(&user_id)
    }

    #[inline]
    pub fn is_owner(&self, user_id: Snowflake) -> bool {
        self.owner_id == user_id
    }
}
