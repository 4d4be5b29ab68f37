//! Conversation view model
//!
//! Stateful core behind one conversation view. It owns the identity, the
//! subscription manager and the rendered state. Batch handlers lock the same
//! state, so the generation check and the list replacement happen together:
//! once a switch has advanced the generation under the lock, no batch of the
//! old channel can touch the visible list.
//!
//! Deliveries also hold a separate gate while the scroll hook runs, and
//! switches take that gate before the state lock. A hint for the old
//! generation is therefore never emitted once a switch has started.

use std::sync::Arc;

use chat_core::{Channel, Identity, Message, Snowflake};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::dto::{ChannelIntent, ConversationPhase, MessageRow, Notice, ReplyContext, ScrollHint};

use super::composer::MessageComposer;
use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::grouping::group_rows;
use super::resolver::ChannelAddressResolver;
use super::subscription::{Batch, BatchHandler, Subscription, SubscriptionManager};

/// Called after every applied batch, outside the state lock.
///
/// Hints arrive in delivery order and never carry a generation older than
/// the latest switch. The hook must not block on the view model itself.
pub type ScrollHook = Arc<dyn Fn(ScrollHint) + Send + Sync>;

#[derive(Default)]
struct ViewState {
    phase: ConversationPhase,
    generation: u64,
    channel: Option<Channel>,
    messages: Vec<Message>,
    reply: Option<ReplyContext>,
    draft: String,
    notice: Option<Notice>,
    scroll_hook: Option<ScrollHook>,
}

impl ViewState {
    fn enter_switching(&mut self, generation: u64, channel: Channel) {
        self.phase = ConversationPhase::Switching;
        self.generation = generation;
        self.channel = Some(channel);
        self.messages.clear();
        self.reply = None;
        self.notice = None;
    }

    fn enter_idle(&mut self, generation: u64) {
        self.phase = ConversationPhase::Idle;
        self.generation = generation;
        self.channel = None;
        self.messages.clear();
        self.reply = None;
    }

    fn find_message(&self, message_id: Snowflake) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == message_id)
    }
}

/// View model for one conversation view
pub struct ConversationViewModel {
    ctx: ServiceContext,
    identity: Identity,
    subscriptions: SubscriptionManager,
    state: Arc<Mutex<ViewState>>,
    /// Held by a delivery from its generation check until its hook returns
    delivery: Arc<Mutex<()>>,
}

impl ConversationViewModel {
    pub fn new(ctx: ServiceContext, identity: Identity) -> Self {
        let subscriptions = SubscriptionManager::new(ctx.message_store_handle());
        Self {
            ctx,
            identity,
            subscriptions,
            state: Arc::new(Mutex::new(ViewState::default())),
            delivery: Arc::new(Mutex::new(())),
        }
    }

    /// Install the post-batch hook
    pub fn set_scroll_hook(&mut self, hook: impl Fn(ScrollHint) + Send + Sync + 'static) {
        self.state.lock().scroll_hook = Some(Arc::new(hook));
    }

    // =========================================================================
    // Channel lifecycle
    // =========================================================================

    /// Resolve `intent` and switch to the resulting channel.
    ///
    /// Failures leave the view `Idle` with a notice.
    ///
    /// # Errors
    /// `AddressResolution` or `Subscription`.
    #[instrument(skip(self), fields(user_id = %self.identity.id, kind = intent.label()))]
    pub async fn open(&mut self, intent: ChannelIntent) -> ServiceResult<Channel> {
        let resolved = ChannelAddressResolver::new(&self.ctx)
            .resolve(self.identity.id, &intent)
            .await;
        let channel = match resolved {
            Ok(channel) => channel,
            Err(e) => return Err(self.fail_to_idle(e)),
        };

        let generation = {
            let _delivery = self.delivery.lock();
            let mut state = self.state.lock();
            let generation = self.subscriptions.begin_switch();
            state.enter_switching(generation, channel.clone());
            generation
        };

        info!(
            channel_id = %channel.id,
            kind = channel.kind.label(),
            generation,
            "Switching channel"
        );

        let handler = self.batch_handler();
        if let Err(e) = self.subscriptions.establish(&channel, generation, handler).await {
            return Err(self.fail_to_idle(e));
        }

        let mut state = self.state.lock();
        if state.generation == generation {
            state.phase = ConversationPhase::Live;
        }
        Ok(channel)
    }

    /// Tear down the subscription and return to `Idle`
    #[instrument(skip(self), fields(user_id = %self.identity.id))]
    pub fn close(&mut self) {
        let _delivery = self.delivery.lock();
        let mut state = self.state.lock();
        self.subscriptions.close();
        state.enter_idle(self.subscriptions.generation());
        info!("Conversation closed");
    }

    // =========================================================================
    // Drafting
    // =========================================================================

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.state.lock().draft = text.into();
    }

    pub fn draft(&self) -> String {
        self.state.lock().draft.clone()
    }

    /// Send the draft, quoting the pending reply if any. On success the draft
    /// and reply are cleared; on failure both are kept for a manual retry.
    ///
    /// # Errors
    /// `EmptyMessage` (no notice), `Validation`, or `Send`.
    #[instrument(skip(self), fields(user_id = %self.identity.id))]
    pub async fn send_draft(&mut self) -> ServiceResult<Message> {
        let (channel, draft, reply) = {
            let state = self.state.lock();
            (state.channel.clone(), state.draft.clone(), state.reply.clone())
        };

        let result = match channel {
            Some(channel) => {
                let composer = MessageComposer::new(&self.ctx);
                match composer.compose(&self.identity, &draft, reply.as_ref().map(|r| &r.message)) {
                    Ok(outbound) => composer.send(&channel, &outbound).await,
                    Err(e) => Err(e),
                }
            }
            None => Err(ServiceError::validation("No channel is open")),
        };

        match result {
            Ok(message) => {
                let mut state = self.state.lock();
                state.draft.clear();
                state.reply = None;
                state.notice = None;
                Ok(message)
            }
            Err(e) => Err(self.surface(e)),
        }
    }

    // =========================================================================
    // Replies
    // =========================================================================

    /// Quote a visible message in the next send
    ///
    /// # Errors
    /// `Validation` when the message is not in the visible list.
    pub fn start_reply(&mut self, message_id: Snowflake) -> ServiceResult<ReplyContext> {
        let mut state = self.state.lock();
        let Some(channel_id) = state.channel.as_ref().map(|c| c.id.clone()) else {
            return Err(ServiceError::validation("No channel is open"));
        };
        let Some(message) = state.find_message(message_id).cloned() else {
            return Err(ServiceError::validation(format!(
                "Message {message_id} is not visible"
            )));
        };

        let context = ReplyContext { channel_id, message };
        state.reply = Some(context.clone());
        debug!(message_id = %message_id, "Reply started");
        Ok(context)
    }

    pub fn cancel_reply(&mut self) {
        self.state.lock().reply = None;
    }

    pub fn reply_context(&self) -> Option<ReplyContext> {
        self.state.lock().reply.clone()
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Delete one of the viewer's messages. The visible list changes only
    /// after the store confirms.
    ///
    /// # Errors
    /// `Validation` when the message is not visible, `Delete` otherwise.
    #[instrument(skip(self), fields(user_id = %self.identity.id))]
    pub async fn delete_message(&mut self, message_id: Snowflake) -> ServiceResult<()> {
        let target = {
            let state = self.state.lock();
            match (&state.channel, state.find_message(message_id)) {
                (Some(channel), Some(message)) => Ok((channel.clone(), message.clone(), state.generation)),
                (None, _) => Err(ServiceError::validation("No channel is open")),
                (Some(_), None) => Err(ServiceError::validation(format!(
                    "Message {message_id} is not visible"
                ))),
            }
        };
        let (channel, message, generation) = match target {
            Ok(target) => target,
            Err(e) => return Err(self.surface(e)),
        };

        if let Err(e) = MessageComposer::new(&self.ctx)
            .delete_message(&channel, &message, self.identity.id)
            .await
        {
            return Err(self.surface(e));
        }

        let mut state = self.state.lock();
        if state.generation == generation {
            state.messages.retain(|m| m.id != message_id);
        }
        state.notice = None;
        Ok(())
    }

    // =========================================================================
    // Presentation
    // =========================================================================

    /// Visible messages with header and ownership flags
    pub fn rows(&self) -> Vec<MessageRow> {
        let messages = self.state.lock().messages.clone();
        group_rows(&messages, self.identity.id, self.ctx.messaging().header_gap())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().messages.clone()
    }

    pub fn phase(&self) -> ConversationPhase {
        self.state.lock().phase
    }

    pub fn active_channel(&self) -> Option<Channel> {
        self.state.lock().channel.clone()
    }

    pub fn last_notice(&self) -> Option<Notice> {
        self.state.lock().notice.clone()
    }

    pub fn clear_notice(&mut self) {
        self.state.lock().notice = None;
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Generation of the current (or most recent) switch
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    pub fn subscription(&self) -> Option<Subscription> {
        self.subscriptions.current().cloned()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn batch_handler(&self) -> BatchHandler {
        let state = Arc::clone(&self.state);
        let delivery = Arc::clone(&self.delivery);
        Arc::new(move |batch: Batch| {
            let _delivery = delivery.lock();
            let hook = {
                let mut state = state.lock();
                if batch.generation != state.generation {
                    debug!(
                        channel_id = %batch.channel_id,
                        generation = batch.generation,
                        current = state.generation,
                        "Discarding batch from previous channel"
                    );
                    return;
                }
                let count = batch.messages.len();
                state.messages = batch.messages;
                state.scroll_hook.clone().map(|hook| (hook, count))
            };

            if let Some((hook, message_count)) = hook {
                hook(ScrollHint {
                    channel_id: batch.channel_id,
                    generation: batch.generation,
                    message_count,
                });
            }
        })
    }

    /// Drop any live subscription, go `Idle`, and record the notice
    fn fail_to_idle(&mut self, err: ServiceError) -> ServiceError {
        warn!(error = %err, code = err.error_code(), "Conversation failed, returning to idle");
        let _delivery = self.delivery.lock();
        let mut state = self.state.lock();
        self.subscriptions.close();
        state.enter_idle(self.subscriptions.generation());
        state.notice = err.to_notice();
        err
    }

    /// Record a notice for a recoverable failure; state is otherwise kept
    fn surface(&self, err: ServiceError) -> ServiceError {
        if let Some(notice) = err.to_notice() {
            debug!(code = %notice.code, "Notice raised");
            self.state.lock().notice = Some(notice);
        }
        err
    }
}

impl std::fmt::Debug for ConversationViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ConversationViewModel")
            .field("identity", &self.identity)
            .field("phase", &state.phase)
            .field("generation", &state.generation)
            .field("channel", &state.channel.as_ref().map(|c| &c.id))
            .field("messages", &state.messages.len())
            .finish()
    }
}
