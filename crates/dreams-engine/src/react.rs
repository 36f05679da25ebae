use tracing::debug;

use dreams_types::events::DreamsEvent;
use dreams_types::models::{MessageId, REACT_LIKE};

use crate::engine::{Engine, no_longer_exists};
use crate::error::{EngineError, EngineResult};

impl Engine {
    /// Add the caller's reaction. The author is notified.
    pub fn react(&self, token: &str, message_id: MessageId, react_id: u32) -> EngineResult<()> {
        let user_id = self.authenticate(token)?;
        let message = self.live_message(message_id)?;
        let conversation = message.conversation;
        self.require_member(conversation, user_id)?;
        check_react_id(react_id)?;

        self.inner
            .store
            .mutate_message(message_id, |m| {
                if m.is_removed {
                    return Err(no_longer_exists(message_id));
                }
                if !m.add_reaction(react_id, user_id) {
                    return Err(EngineError::validation(format!(
                        "User {} already reacted to message {}",
                        user_id, message_id
                    )));
                }
                Ok(())
            })?
            .ok_or_else(|| no_longer_exists(message_id))?;

        debug!("User {} reacted {} to message {}", user_id, react_id, message_id);
        let text = format!(
            "{} reacted to your message in {}",
            self.handle(user_id)?,
            self.conversation_name(conversation)?
        );
        self.notify(message.author_id, conversation, text)?;
        self.publish(DreamsEvent::ReactionAdd {
            message_id,
            user_id,
            react_id,
        });
        Ok(())
    }

    pub fn unreact(&self, token: &str, message_id: MessageId, react_id: u32) -> EngineResult<()> {
        let user_id = self.authenticate(token)?;
        let message = self.live_message(message_id)?;
        self.require_member(message.conversation, user_id)?;
        check_react_id(react_id)?;

        self.inner
            .store
            .mutate_message(message_id, |m| {
                if m.is_removed {
                    return Err(no_longer_exists(message_id));
                }
                if !m.remove_reaction(react_id, user_id) {
                    return Err(EngineError::validation(format!(
                        "User {} has not reacted to message {}",
                        user_id, message_id
                    )));
                }
                Ok(())
            })?
            .ok_or_else(|| no_longer_exists(message_id))?;

        debug!("User {} withdrew reaction {} from message {}", user_id, react_id, message_id);
        self.publish(DreamsEvent::ReactionRemove {
            message_id,
            user_id,
            react_id,
        });
        Ok(())
    }
}

fn check_react_id(react_id: u32) -> EngineResult<()> {
    if react_id == REACT_LIKE {
        Ok(())
    } else {
        Err(EngineError::validation(format!("Unknown react id {}", react_id)))
    }
}
