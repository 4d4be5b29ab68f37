//! Message composition, sending and deletion

use chat_core::{Channel, DomainError, Identity, Message, OutboundMessage, ReplySnapshot, Snowflake};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::dto::SendMessageRequest;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Message composer
pub struct MessageComposer<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MessageComposer<'a> {
    /// Create a new MessageComposer
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Build an outbound message from the draft. The reply quote is captured
    /// now, so later changes to the quoted message never reach it.
    ///
    /// # Errors
    /// `EmptyMessage` for blank drafts, `Validation` when the text is too long.
    pub fn compose(
        &self,
        sender: &Identity,
        text: &str,
        reply_to: Option<&Message>,
    ) -> ServiceResult<OutboundMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::EmptyMessage);
        }

        let request = SendMessageRequest::new(text, self.ctx.messaging().max_message_length);
        request.validate()?;

        Ok(OutboundMessage {
            sender_id: sender.id,
            sender_name: sender.display_name.clone(),
            text: request.text,
            reply_to: reply_to.map(ReplySnapshot::capture),
        })
    }

    /// Append to the channel's stream. Never retried.
    #[instrument(skip(self, channel, outbound), fields(channel_id = %channel.id, user_id = %outbound.sender_id))]
    pub async fn send(&self, channel: &Channel, outbound: &OutboundMessage) -> ServiceResult<Message> {
        let message = self
            .ctx
            .message_store()
            .append_message(&channel.storage_path, outbound)
            .await
            .map_err(|e| {
                warn!(error = %e, "Send failed");
                ServiceError::Send(e)
            })?;

        info!(
            message_id = %message.id,
            is_reply = message.is_reply(),
            "Message sent"
        );

        Ok(message)
    }

    /// Delete `message` on behalf of `requester`.
    ///
    /// The sender check here only saves a round trip; the store enforces it
    /// again.
    #[instrument(skip(self, channel, message), fields(channel_id = %channel.id, message_id = %message.id))]
    pub async fn delete_message(
        &self,
        channel: &Channel,
        message: &Message,
        requester: Snowflake,
    ) -> ServiceResult<()> {
        if !message.is_from(requester) {
            return Err(ServiceError::Delete(DomainError::NotMessageSender));
        }

        self.ctx
            .message_store()
            .delete_message(&channel.storage_path, message.id, requester)
            .await
            .map_err(|e| {
                warn!(error = %e, "Delete failed");
                ServiceError::Delete(e)
            })?;

        info!("Message deleted");
        Ok(())
    }
}
