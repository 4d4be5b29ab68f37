//! Canonical direct-message key
//!
//! A DM is addressed by the unordered pair of its participants. Sorting the
//! pair before rendering makes the key independent of who opens the
//! conversation, which is what lets both sides converge on one channel.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Snowflake;
use crate::error::DomainError;

const DM_KEY_PREFIX: &str = "dm_";

/// Participant-order-independent identifier of a two-party conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DmKey {
    low: Snowflake,
    high: Snowflake,
}

impl DmKey {
    /// Build the key for a pair of distinct users.
    ///
    /// # Errors
    /// `SelfDirectMessage` when both ids are equal.
    pub fn new(a: Snowflake, b: Snowflake) -> Result<Self, DomainError> {
        if a == b {
            return Err(DomainError::SelfDirectMessage);
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { low, high })
    }

    #[must_use]
    pub fn participants(&self) -> [Snowflake; 2] {
        [self.low, self.high]
    }

    #[must_use]
    pub fn includes(&self, user_id: Snowflake) -> bool {
        self.low == user_id || self.high == user_id
    }

    /// The participant that is not `user_id`, if `user_id` is part of the key
    #[must_use]
    pub fn counterpart(&self, user_id: Snowflake) -> Option<Snowflake> {
        if user_id == self.low {
            Some(self.high)
        } else if user_id == self.high {
            Some(self.low)
        } else {
            None
        }
    }

    /// Parse a rendered key (`dm_{low}_{high}`)
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::ValidationError(format!("invalid DM key: {raw}"));
        let rest = raw.strip_prefix(DM_KEY_PREFIX).ok_or_else(invalid)?;
        let (a, b) = rest.split_once('_').ok_or_else(invalid)?;
        let a = Snowflake::parse(a).map_err(|_| invalid())?;
        let b = Snowflake::parse(b).map_err(|_| invalid())?;
        Self::new(a, b)
    }
}

impl fmt::Display for DmKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{DM_KEY_PREFIX}{}_{}", self.low, self.high)
    }
}
