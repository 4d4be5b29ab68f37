//! User-facing identity records

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// The authenticated user driving a conversation view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Snowflake,
    pub display_name: String,
}

impl Identity {
    pub fn new(id: Snowflake, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

/// Directory entry for another user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Snowflake,
    pub display_name: String,
    /// Last sign-in as recorded by the directory. Never expires on its own,
    /// so it only feeds [`PresenceHint`].
    pub last_login: Option<DateTime<Utc>>,
}

impl UserSummary {
    pub fn new(id: Snowflake, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            last_login: None,
        }
    }

    #[must_use]
    pub fn with_last_login(mut self, at: DateTime<Utc>) -> Self {
        self.last_login = Some(at);
        self
    }

    /// Display-only activity hint derived from `last_login`
    pub fn presence_hint(&self, now: DateTime<Utc>, window: Duration) -> PresenceHint {
        match self.last_login {
            Some(at) if at <= now && now - at <= window => PresenceHint::RecentlyActive,
            _ => PresenceHint::Away,
        }
    }
}

/// Non-authoritative activity hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceHint {
    RecentlyActive,
    Away,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_hint_window() {
        let now = Utc::now();
        let window = Duration::minutes(5);
        let user = UserSummary::new(Snowflake::new(1), "Ada");

        assert_eq!(user.presence_hint(now, window), PresenceHint::Away);

        let recent = user.clone().with_last_login(now - Duration::minutes(2));
        assert_eq!(recent.presence_hint(now, window), PresenceHint::RecentlyActive);

        let stale = user.with_last_login(now - Duration::hours(3));
        assert_eq!(stale.presence_hint(now, window), PresenceHint::Away);
    }
}
