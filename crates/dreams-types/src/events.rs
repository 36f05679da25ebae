use serde::{Deserialize, Serialize};

use crate::models::{ConversationRef, MessageId, UserId};

/// Events published by the message engine after a mutation commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DreamsEvent {
    /// A message became visible in a conversation (send, share, deferred or standup)
    MessageCreate {
        message_id: MessageId,
        conversation: ConversationRef,
        author_id: UserId,
    },

    MessageEdit {
        message_id: MessageId,
        conversation: ConversationRef,
    },

    MessageRemove {
        message_id: MessageId,
        conversation: ConversationRef,
    },

    /// Pin state changed
    MessagePin {
        message_id: MessageId,
        conversation: ConversationRef,
        is_pinned: bool,
    },

    ReactionAdd {
        message_id: MessageId,
        user_id: UserId,
        react_id: u32,
    },

    ReactionRemove {
        message_id: MessageId,
        user_id: UserId,
        react_id: u32,
    },

    /// A standup window closed and its buffer was posted (or dead-lettered)
    StandupFinish {
        conversation: ConversationRef,
        message_id: Option<MessageId>,
    },

    /// A deferred delivery could not be materialized when its timer fired.
    /// Nobody is waiting on the original request, so this is the dead-letter record.
    DeliveryFailed {
        message_id: Option<MessageId>,
        conversation: ConversationRef,
        reason: String,
    },
}

impl DreamsEvent {
    /// Returns the conversation this event is scoped to, if any.
    pub fn conversation(&self) -> Option<ConversationRef> {
        match self {
            Self::MessageCreate { conversation, .. }
            | Self::MessageEdit { conversation, .. }
            | Self::MessageRemove { conversation, .. }
            | Self::MessagePin { conversation, .. }
            | Self::StandupFinish { conversation, .. }
            | Self::DeliveryFailed { conversation, .. } => Some(*conversation),
            // Reaction events are keyed by message only
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_is_tagged() {
        let event = DreamsEvent::MessagePin {
            message_id: 4,
            conversation: ConversationRef::Dm(2),
            is_pinned: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "MessagePin");
        assert_eq!(json["data"]["conversation"]["kind"], "dm");
        assert_eq!(json["data"]["conversation"]["id"], 2);
        assert_eq!(event.conversation(), Some(ConversationRef::Dm(2)));
    }

    #[test]
    fn reactions_carry_no_conversation() {
        let event = DreamsEvent::ReactionAdd {
            message_id: 1,
            user_id: 1,
            react_id: 1,
        };
        assert_eq!(event.conversation(), None);
    }
}
