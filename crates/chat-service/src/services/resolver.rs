//! Channel address resolution
//!
//! Turns a user intent into a fully resolved [`Channel`] whose storage path
//! is fixed for the channel's lifetime.

use chat_core::{Channel, DmKey, DomainError, Snowflake};
use tracing::{debug, info, instrument};

use crate::dto::ChannelIntent;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Channel address resolver
pub struct ChannelAddressResolver<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ChannelAddressResolver<'a> {
    /// Create a new ChannelAddressResolver
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Resolve any intent on behalf of `self_id`
    pub async fn resolve(&self, self_id: Snowflake, intent: &ChannelIntent) -> ServiceResult<Channel> {
        match intent {
            ChannelIntent::Public { name } => self.resolve_public(name),
            ChannelIntent::Group {
                group_id,
                display_name,
            } => self.resolve_group(*group_id, display_name).await,
            ChannelIntent::Direct { user_id } => self.resolve_or_create_dm(self_id, *user_id).await,
        }
    }

    /// Map a configured public channel name to its channel
    pub fn resolve_public(&self, name: &str) -> ServiceResult<Channel> {
        let name = name.trim();
        if !self.ctx.messaging().is_public_channel(name) {
            return Err(ServiceError::AddressResolution(DomainError::ChannelNotFound(
                name.to_string(),
            )));
        }
        Ok(Channel::public(name))
    }

    /// Map a group to its channel, looking the name up when none is given
    #[instrument(skip(self, display_name))]
    pub async fn resolve_group(&self, group_id: Snowflake, display_name: &str) -> ServiceResult<Channel> {
        let display_name = display_name.trim();
        if !display_name.is_empty() {
            return Ok(Channel::group(group_id, display_name.to_string()));
        }

        let group = self
            .ctx
            .directory_store()
            .find_group(group_id)
            .await
            .map_err(ServiceError::AddressResolution)?
            .ok_or(ServiceError::AddressResolution(DomainError::GroupNotFound(group_id)))?;

        debug!(group_id = %group_id, name = %group.name, "Group name looked up");
        Ok(Channel::group(group_id, group.name))
    }

    /// Find the direct message channel shared by `self_id` and `other_id`,
    /// creating it on first use. Either participant gets the same channel.
    #[instrument(skip(self))]
    pub async fn resolve_or_create_dm(&self, self_id: Snowflake, other_id: Snowflake) -> ServiceResult<Channel> {
        let key = DmKey::new(self_id, other_id).map_err(ServiceError::AddressResolution)?;

        let counterpart = self
            .ctx
            .directory_store()
            .find_user(other_id)
            .await
            .map_err(ServiceError::AddressResolution)?
            .ok_or(ServiceError::AddressResolution(DomainError::UserNotFound(other_id)))?;

        let storage_path = self
            .ctx
            .message_store()
            .find_or_create_dm_storage_path(&key)
            .await
            .map_err(ServiceError::AddressResolution)?;

        info!(
            dm_key = %key,
            storage_path = %storage_path,
            "DM channel resolved"
        );

        Ok(Channel::dm(key, counterpart.display_name, storage_path))
    }
}
