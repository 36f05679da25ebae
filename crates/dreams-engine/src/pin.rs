use tracing::debug;

use dreams_types::events::DreamsEvent;
use dreams_types::models::MessageId;

use crate::engine::{Engine, no_longer_exists};
use crate::error::{EngineError, EngineResult};

impl Engine {
    pub fn pin(&self, token: &str, message_id: MessageId) -> EngineResult<()> {
        self.set_pinned(token, message_id, true)
    }

    pub fn unpin(&self, token: &str, message_id: MessageId) -> EngineResult<()> {
        self.set_pinned(token, message_id, false)
    }

    fn set_pinned(&self, token: &str, message_id: MessageId, pinned: bool) -> EngineResult<()> {
        let user_id = self.authenticate(token)?;
        let message = self.live_message(message_id)?;
        let conversation = message.conversation;
        self.require_member(conversation, user_id)?;
        if !self.is_owner(conversation, user_id)? {
            return Err(EngineError::auth(format!(
                "User {} does not own {}",
                user_id, conversation
            )));
        }

        // Pin state is re-read under the write lock so two racing pins cannot
        // both succeed.
        self.inner
            .store
            .mutate_message(message_id, |m| {
                if m.is_removed {
                    return Err(no_longer_exists(message_id));
                }
                if m.is_pinned == pinned {
                    let state = if pinned { "already pinned" } else { "not pinned" };
                    return Err(EngineError::validation(format!("Message {} is {}", message_id, state)));
                }
                m.is_pinned = pinned;
                Ok(())
            })?
            .ok_or_else(|| no_longer_exists(message_id))?;

        debug!("User {} set pinned={} on message {}", user_id, pinned, message_id);
        self.publish(DreamsEvent::MessagePin {
            message_id,
            conversation,
            is_pinned: pinned,
        });
        Ok(())
    }
}
