use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use dreams_db::Database;
use dreams_types::events::DreamsEvent;
use dreams_types::models::{ConversationRef, Message, MessageId, Notification, UserId};

use crate::dispatcher::Dispatcher;
use crate::error::{EngineError, EngineResult};
use crate::gate::{ConversationDirectory, IdentityGate, NotificationSink};
use crate::mention::{find_mention, preview};
use crate::scheduler::Scheduler;

/// Longest accepted message body, in characters.
pub const MAX_MESSAGE_LEN: usize = 1000;

/// Messages per page of conversation history.
pub const PAGE_SIZE: usize = 50;

/// Characters of the body quoted in a mention notification.
pub const MENTION_PREVIEW_LEN: usize = 20;

/// The message lifecycle engine. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Engine {
    pub(crate) inner: Arc<EngineInner>,
}

pub(crate) struct EngineInner {
    pub(crate) store: Arc<Database>,
    pub(crate) identity: Arc<dyn IdentityGate>,
    pub(crate) directory: Arc<dyn ConversationDirectory>,
    pub(crate) notifier: Arc<dyn NotificationSink>,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) scheduler: Scheduler,
}

impl Engine {
    /// Build an engine whose directory and notification sink are the store itself.
    pub fn new(store: Arc<Database>, identity: Arc<dyn IdentityGate>) -> Self {
        let directory: Arc<dyn ConversationDirectory> = store.clone();
        let notifier: Arc<dyn NotificationSink> = store.clone();
        Self::with_collaborators(store, identity, directory, notifier)
    }

    pub fn with_collaborators(
        store: Arc<Database>,
        identity: Arc<dyn IdentityGate>,
        directory: Arc<dyn ConversationDirectory>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store,
                identity,
                directory,
                notifier,
                dispatcher: Dispatcher::new(),
                scheduler: Scheduler::new(),
            }),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DreamsEvent> {
        self.inner.dispatcher.subscribe()
    }

    // -- Shared precondition checks --

    pub(crate) fn authenticate(&self, token: &str) -> EngineResult<UserId> {
        self.inner.identity.authenticate(token)
    }

    pub(crate) fn require_conversation(&self, conversation: ConversationRef) -> EngineResult<()> {
        if self.inner.directory.exists(conversation)? {
            Ok(())
        } else {
            Err(EngineError::validation(format!("{} does not exist", conversation)))
        }
    }

    pub(crate) fn is_member(&self, conversation: ConversationRef, user_id: UserId) -> EngineResult<bool> {
        Ok(self
            .inner
            .directory
            .members_of(conversation)?
            .is_some_and(|members| members.contains(&user_id)))
    }

    pub(crate) fn require_member(&self, conversation: ConversationRef, user_id: UserId) -> EngineResult<()> {
        if self.is_member(conversation, user_id)? {
            Ok(())
        } else {
            Err(EngineError::auth(format!("User {} is not a member of {}", user_id, conversation)))
        }
    }

    pub(crate) fn is_owner(&self, conversation: ConversationRef, user_id: UserId) -> EngineResult<bool> {
        Ok(self
            .inner
            .directory
            .owners_of(conversation)?
            .is_some_and(|owners| owners.contains(&user_id)))
    }

    /// The canonical record of a message that exists and has not been removed.
    pub(crate) fn live_message(&self, message_id: MessageId) -> EngineResult<Message> {
        match self.inner.store.find_message(message_id)? {
            Some(message) if !message.is_removed => Ok(message),
            _ => Err(no_longer_exists(message_id)),
        }
    }

    pub(crate) fn handle(&self, user_id: UserId) -> EngineResult<String> {
        self.inner
            .directory
            .handle_of(user_id)?
            .ok_or_else(|| EngineError::Configuration(format!("User {} has no handle", user_id)))
    }

    pub(crate) fn conversation_name(&self, conversation: ConversationRef) -> EngineResult<String> {
        self.inner
            .directory
            .name_of(conversation)?
            .ok_or_else(|| EngineError::validation(format!("{} does not exist", conversation)))
    }

    // -- Side effects --

    pub(crate) fn notify(&self, user_id: UserId, conversation: ConversationRef, text: String) -> EngineResult<()> {
        debug!("Notify user {}: {}", user_id, text);
        self.inner
            .notifier
            .notify(user_id, Notification { conversation, text })?;
        Ok(())
    }

    pub(crate) fn publish(&self, event: DreamsEvent) {
        self.inner.dispatcher.broadcast(event);
    }

    /// Side effects that follow every message creation: tag notification and
    /// the `MessageCreate` event. The message is already committed, so a failed
    /// notification is logged rather than returned.
    pub(crate) fn after_create(&self, message: &Message) {
        if let Some(handle) = find_mention(&message.body) {
            if let Err(e) = self.notify_mention(message, handle) {
                warn!("Mention notification for message {} failed: {}", message.message_id, e);
            }
        }
        self.publish(DreamsEvent::MessageCreate {
            message_id: message.message_id,
            conversation: message.conversation,
            author_id: message.author_id,
        });
    }

    fn notify_mention(&self, message: &Message, handle: &str) -> EngineResult<()> {
        let members = self
            .inner
            .directory
            .members_of(message.conversation)?
            .unwrap_or_default();

        let mut tagged = None;
        for member in members {
            if self.inner.directory.handle_of(member)?.as_deref() == Some(handle) {
                tagged = Some(member);
                break;
            }
        }
        let Some(tagged) = tagged else {
            debug!("Mention @{} in message {} matches no member", handle, message.message_id);
            return Ok(());
        };

        let text = format!(
            "{} tagged you in {}: {}",
            self.handle(message.author_id)?,
            self.conversation_name(message.conversation)?,
            preview(&message.body, MENTION_PREVIEW_LEN)
        );
        self.notify(tagged, message.conversation, text)
    }

    /// Report a deferred creation that could not be carried out. There is no
    /// caller left to return the error to.
    pub(crate) fn dead_letter(
        &self,
        message_id: Option<MessageId>,
        conversation: ConversationRef,
        reason: String,
    ) {
        warn!("Deferred delivery into {} failed: {}", conversation, reason);
        self.inner.dispatcher.dead_letter(DreamsEvent::DeliveryFailed {
            message_id,
            conversation,
            reason,
        });
    }
}

pub(crate) fn check_length(body: &str) -> EngineResult<()> {
    if body.chars().count() > MAX_MESSAGE_LEN {
        Err(EngineError::validation(format!(
            "Message exceeds {} characters",
            MAX_MESSAGE_LEN
        )))
    } else {
        Ok(())
    }
}

pub(crate) fn no_longer_exists(message_id: MessageId) -> EngineError {
    EngineError::validation(format!("Message {} no longer exists", message_id))
}
