//! Directory index - what the channel picker shows
//!
//! Read-only: loads groups, existing DM channels and coworkers on demand.
//! Coworkers are users sharing at least one group with the viewer.

use std::collections::{BTreeSet, HashMap};

use chat_core::{Identity, Snowflake, UserSummary};
use chrono::Utc;
use tracing::{debug, instrument};

use crate::dto::{CoworkerEntry, DirectorySnapshot, DmEntry, GroupEntry};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Directory index
pub struct DirectoryIndex<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> DirectoryIndex<'a> {
    /// Create a new DirectoryIndex
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Load the directory as seen by `identity`
    ///
    /// # Errors
    /// `Directory` when a store lookup fails.
    #[instrument(skip(self, identity), fields(user_id = %identity.id))]
    pub async fn load(&self, identity: &Identity) -> ServiceResult<DirectorySnapshot> {
        let groups = self
            .ctx
            .directory_store()
            .list_groups_for_user(identity.id)
            .await
            .map_err(ServiceError::Directory)?;

        let users: HashMap<Snowflake, UserSummary> = self
            .ctx
            .directory_store()
            .list_users()
            .await
            .map_err(ServiceError::Directory)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let dm_keys = self
            .ctx
            .message_store()
            .list_dm_channels(identity.id)
            .await
            .map_err(ServiceError::Directory)?;

        let mut direct_messages: Vec<DmEntry> = dm_keys
            .into_iter()
            .filter_map(|key| {
                let counterpart = users.get(&key.counterpart(identity.id)?)?;
                Some(DmEntry::new(key, counterpart))
            })
            .collect();
        direct_messages.sort_by(|a, b| a.counterpart_name.cmp(&b.counterpart_name));

        let coworker_ids: BTreeSet<Snowflake> = groups
            .iter()
            .flat_map(|g| g.member_ids.iter().copied())
            .filter(|id| *id != identity.id)
            .collect();

        let now = Utc::now();
        let window = self.ctx.messaging().presence_window();
        let mut coworkers: Vec<CoworkerEntry> = coworker_ids
            .iter()
            .filter_map(|id| users.get(id))
            .map(|user| CoworkerEntry::new(user, user.presence_hint(now, window)))
            .collect();
        coworkers.sort_by(|a, b| a.display_name.cmp(&b.display_name).then(a.id.cmp(&b.id)));

        let mut groups: Vec<GroupEntry> = groups
            .iter()
            .map(|g| GroupEntry::from_group(g, identity.id))
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(
            groups = groups.len(),
            direct_messages = direct_messages.len(),
            coworkers = coworkers.len(),
            "Directory loaded"
        );

        Ok(DirectorySnapshot {
            public_channels: self.ctx.messaging().public_channels.clone(),
            groups,
            direct_messages,
            coworkers,
        })
    }

    /// Coworkers `identity` has no direct message channel with yet
    ///
    /// # Errors
    /// See [`Self::load`].
    pub async fn dm_candidates(&self, identity: &Identity) -> ServiceResult<Vec<CoworkerEntry>> {
        Ok(self.load(identity).await?.dm_candidates())
    }
}
