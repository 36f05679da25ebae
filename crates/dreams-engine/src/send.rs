use tracing::{debug, info};

use dreams_types::api::{MessagePage, MessageView};
use dreams_types::models::{ChannelId, ConversationRef, DmId, MessageId, UserId};

use crate::engine::{Engine, PAGE_SIZE, check_length};
use crate::error::{EngineError, EngineResult};
use crate::quote::compose_share;
use crate::scheduler::{TaskKey, delay_until};

impl Engine {
    /// Post `body` into a conversation the caller belongs to.
    pub fn send(&self, token: &str, conversation: ConversationRef, body: &str) -> EngineResult<MessageId> {
        let user_id = self.authenticate(token)?;
        check_length(body)?;
        self.require_conversation(conversation)?;
        self.require_member(conversation, user_id)?;

        let message = self.inner.store.create_message(user_id, conversation, body, false)?;
        debug!("User {} sent message {} to {}", user_id, message.message_id, conversation);
        self.after_create(&message);
        Ok(message.message_id)
    }

    /// Up to 50 messages, most recent first, starting `start` messages back.
    pub fn paginate(&self, token: &str, conversation: ConversationRef, start: i64) -> EngineResult<MessagePage> {
        let user_id = self.authenticate(token)?;
        if start < 0 {
            return Err(EngineError::validation("Start must not be negative"));
        }
        self.require_conversation(conversation)?;
        self.require_member(conversation, user_id)?;

        let page = self
            .inner
            .store
            .conversation_page(conversation, start as usize, PAGE_SIZE)?
            .ok_or_else(|| EngineError::validation(format!("{} does not exist", conversation)))?;

        let next = start as usize + PAGE_SIZE;
        let end = if next < page.total { next as i64 } else { -1 };
        Ok(MessagePage {
            messages: page
                .messages
                .iter()
                .map(|m| MessageView::project(m, user_id))
                .collect(),
            start,
            end,
        })
    }

    /// Quote an existing message into a channel or DM, with optional extra text.
    /// Exactly one of `channel_id` and `dm_id` must be given.
    pub fn share(
        &self,
        token: &str,
        source_id: MessageId,
        extra: &str,
        channel_id: Option<ChannelId>,
        dm_id: Option<DmId>,
    ) -> EngineResult<MessageId> {
        let user_id = self.authenticate(token)?;
        let target = match (channel_id, dm_id) {
            (Some(id), None) => ConversationRef::Channel(id),
            (None, Some(id)) => ConversationRef::Dm(id),
            _ => {
                return Err(EngineError::validation(
                    "Exactly one of channel_id and dm_id must be given",
                ));
            }
        };
        let source = self.live_message(source_id)?;
        self.require_conversation(target)?;
        self.require_member(target, user_id)?;

        let body = compose_share(extra, &source.body, source.was_shared);
        check_length(&body)?;

        let message = self.inner.store.create_message(user_id, target, &body, true)?;
        debug!("User {} shared message {} as {} in {}", user_id, source_id, message.message_id, target);
        self.after_create(&message);
        Ok(message.message_id)
    }

    /// Schedule `body` to be posted at `send_at` (seconds since the epoch). The
    /// identifier is reserved now and returned immediately.
    pub fn send_later(
        &self,
        token: &str,
        conversation: ConversationRef,
        body: &str,
        send_at: i64,
    ) -> EngineResult<MessageId> {
        let user_id = self.authenticate(token)?;
        self.require_conversation(conversation)?;
        check_length(body)?;
        let delay = delay_until(send_at)
            .ok_or_else(|| EngineError::validation("Can't send a message to the past"))?;
        self.require_member(conversation, user_id)?;

        let message_id = self.inner.store.allocate_message_id()?;
        let engine = self.clone();
        let body = body.to_string();
        self.inner.scheduler.schedule(
            TaskKey::Delivery(message_id),
            user_id,
            delay,
            async move { engine.fire_delivery(message_id, user_id, conversation, &body) },
        )?;

        info!("Message {} scheduled for {} in {:?}", message_id, conversation, delay);
        Ok(message_id)
    }

    /// Cancel a pending send-later. Only the user who scheduled it may do so.
    pub fn cancel_send_later(&self, token: &str, message_id: MessageId) -> EngineResult<()> {
        let user_id = self.authenticate(token)?;
        let key = TaskKey::Delivery(message_id);
        let owner = self
            .inner
            .scheduler
            .owner_of(key)?
            .ok_or_else(|| EngineError::validation(format!("No pending delivery for message {}", message_id)))?;
        if owner != user_id {
            return Err(EngineError::auth(format!(
                "Message {} was scheduled by another user",
                message_id
            )));
        }
        if !self.inner.scheduler.cancel(key)? {
            // Fired between the lookup and the cancel.
            return Err(EngineError::validation(format!("Message {} was already delivered", message_id)));
        }
        info!("Cancelled delivery of message {}", message_id);
        Ok(())
    }

    fn fire_delivery(&self, message_id: MessageId, author_id: UserId, conversation: ConversationRef, body: &str) {
        match self
            .inner
            .store
            .create_message_with_id(message_id, author_id, conversation, body)
        {
            Ok(message) => {
                info!("Delivered scheduled message {} to {}", message_id, conversation);
                self.after_create(&message);
            }
            Err(e) => self.dead_letter(Some(message_id), conversation, e.to_string()),
        }
    }
}
