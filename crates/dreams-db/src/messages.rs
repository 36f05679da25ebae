use anyhow::{Result, anyhow, bail};
use dreams_types::models::{ConversationRef, Message, MessageId, UserId};

use crate::Database;
use crate::models::State;

/// One page of a conversation, newest first, plus the number of visible messages.
#[derive(Debug)]
pub struct ConversationPage {
    pub messages: Vec<Message>,
    pub total: usize,
}

impl Database {
    /// Reserve an identifier without creating a message. Used by deferred
    /// delivery, which materializes the message later under this identifier.
    pub fn allocate_message_id(&self) -> Result<MessageId> {
        self.with_state_mut(|state| Ok(next_message_id(state)))
    }

    /// Allocate an identifier and append the message to the global index and to
    /// its conversation view, in one critical section.
    pub fn create_message(
        &self,
        author_id: UserId,
        conversation: ConversationRef,
        body: &str,
        was_shared: bool,
    ) -> Result<Message> {
        self.with_state_mut(|state| {
            ensure_conversation(state, conversation)?;
            let id = next_message_id(state);
            let message = Message::new(id, author_id, conversation, body.to_string(), was_shared);
            append(state, message.clone());
            Ok(message)
        })
    }

    /// Materialize a message under an identifier obtained from
    /// `allocate_message_id`. Fails if the author has since been removed.
    pub fn create_message_with_id(
        &self,
        message_id: MessageId,
        author_id: UserId,
        conversation: ConversationRef,
        body: &str,
    ) -> Result<Message> {
        self.with_state_mut(|state| {
            ensure_conversation(state, conversation)?;
            if message_id >= state.next_message_id {
                bail!("Message id {} was never allocated", message_id);
            }
            if state.messages.contains_key(&message_id) {
                bail!("Message id {} is already materialized", message_id);
            }
            if !state.users.get(&author_id).is_some_and(|u| !u.is_removed) {
                bail!("Author {} is no longer on the platform", author_id);
            }
            let message = Message::new(message_id, author_id, conversation, body.to_string(), false);
            append(state, message.clone());
            Ok(message)
        })
    }

    /// Look up a message, removed or not.
    pub fn find_message(&self, message_id: MessageId) -> Result<Option<Message>> {
        self.with_state(|state| Ok(state.messages.get(&message_id).cloned()))
    }

    /// Apply `f` to the canonical record under the store write lock. `f` sees the
    /// current state, so precondition checks inside it cannot race another
    /// mutation. Returns `Ok(None)` if the message does not exist.
    pub fn mutate_message<T, E, F>(&self, message_id: MessageId, f: F) -> std::result::Result<Option<T>, E>
    where
        E: From<anyhow::Error>,
        F: FnOnce(&mut Message) -> std::result::Result<T, E>,
    {
        let mut state = self.write()?;
        match state.messages.get_mut(&message_id) {
            Some(message) => f(message).map(Some),
            None => Ok(None),
        }
    }

    /// Newest-first slice of the non-removed messages in a conversation.
    /// Returns `None` if the conversation does not exist.
    pub fn conversation_page(
        &self,
        conversation: ConversationRef,
        start: usize,
        limit: usize,
    ) -> Result<Option<ConversationPage>> {
        self.with_state(|state| {
            let Some(view) = state.views.get(&conversation) else {
                return Ok(None);
            };
            let visible: Vec<&Message> = view
                .iter()
                .rev()
                .filter_map(|id| state.messages.get(id))
                .filter(|m| !m.is_removed)
                .collect();
            let total = visible.len();
            let messages = visible
                .into_iter()
                .skip(start)
                .take(limit)
                .cloned()
                .collect();
            Ok(Some(ConversationPage { messages, total }))
        })
    }
}

fn next_message_id(state: &mut State) -> MessageId {
    let id = state.next_message_id;
    state.next_message_id += 1;
    id
}

fn ensure_conversation(state: &State, conversation: ConversationRef) -> Result<()> {
    if state.conversation_exists(conversation) && state.views.contains_key(&conversation) {
        Ok(())
    } else {
        Err(anyhow!("Conversation {} does not exist", conversation))
    }
}

fn append(state: &mut State, message: Message) {
    let id = message.message_id;
    let conversation = message.conversation;
    state.messages.insert(id, message);
    state.views.entry(conversation).or_default().push(id);
}
