use tracing::debug;

use dreams_types::events::DreamsEvent;
use dreams_types::models::{Message, MessageId, UserId};

use crate::engine::{Engine, check_length, no_longer_exists};
use crate::error::{EngineError, EngineResult};

impl Engine {
    /// Replace a message's body. An empty body removes the message instead.
    pub fn edit(&self, token: &str, message_id: MessageId, new_body: &str) -> EngineResult<()> {
        let user_id = self.authenticate(token)?;
        let message = self.live_message(message_id)?;
        check_length(new_body)?;
        self.require_editor(&message, user_id)?;

        if new_body.is_empty() {
            return self.remove_checked(message_id, &message);
        }

        self.inner
            .store
            .mutate_message(message_id, |m| {
                if m.is_removed {
                    return Err(no_longer_exists(message_id));
                }
                m.body = new_body.to_string();
                Ok(())
            })?
            .ok_or_else(|| no_longer_exists(message_id))?;

        debug!("User {} edited message {}", user_id, message_id);
        self.publish(DreamsEvent::MessageEdit {
            message_id,
            conversation: message.conversation,
        });
        Ok(())
    }

    /// Soft-remove a message. It stays resolvable by identifier but drops out of
    /// listings and can no longer be acted on.
    pub fn remove(&self, token: &str, message_id: MessageId) -> EngineResult<()> {
        let user_id = self.authenticate(token)?;
        let message = self.live_message(message_id)?;
        self.require_editor(&message, user_id)?;
        self.remove_checked(message_id, &message)
    }

    fn remove_checked(&self, message_id: MessageId, message: &Message) -> EngineResult<()> {
        self.inner
            .store
            .mutate_message(message_id, |m| {
                if m.is_removed {
                    return Err(no_longer_exists(message_id));
                }
                m.is_removed = true;
                Ok(())
            })?
            .ok_or_else(|| no_longer_exists(message_id))?;

        debug!("Message {} removed from {}", message_id, message.conversation);
        self.publish(DreamsEvent::MessageRemove {
            message_id,
            conversation: message.conversation,
        });
        Ok(())
    }

    /// The author, an owner of the conversation, or a global owner.
    fn require_editor(&self, message: &Message, user_id: UserId) -> EngineResult<()> {
        if message.author_id == user_id
            || self.is_owner(message.conversation, user_id)?
            || self.inner.directory.is_global_owner(user_id)?
        {
            Ok(())
        } else {
            Err(EngineError::auth(format!(
                "User {} may not modify message {}",
                user_id, message.message_id
            )))
        }
    }
}
