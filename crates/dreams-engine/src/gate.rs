use anyhow::Result;
use dreams_db::Database;
use dreams_types::models::{ConversationRef, Notification, UserId};

use crate::error::EngineResult;

/// Resolves a session token to the user behind it.
pub trait IdentityGate: Send + Sync {
    /// Fails with `EngineError::Auth` for a missing, malformed, expired or
    /// logged-out token.
    fn authenticate(&self, token: &str) -> EngineResult<UserId>;
}

/// Membership, ownership and naming of channels and DMs.
pub trait ConversationDirectory: Send + Sync {
    fn exists(&self, conversation: ConversationRef) -> Result<bool>;
    fn name_of(&self, conversation: ConversationRef) -> Result<Option<String>>;
    fn members_of(&self, conversation: ConversationRef) -> Result<Option<Vec<UserId>>>;
    /// Channel owners; for a DM, its creator.
    fn owners_of(&self, conversation: ConversationRef) -> Result<Option<Vec<UserId>>>;
    fn handle_of(&self, user_id: UserId) -> Result<Option<String>>;
    fn is_global_owner(&self, user_id: UserId) -> Result<bool>;
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, user_id: UserId, notification: Notification) -> Result<()>;
}

impl ConversationDirectory for Database {
    fn exists(&self, conversation: ConversationRef) -> Result<bool> {
        self.conversation_exists(conversation)
    }

    fn name_of(&self, conversation: ConversationRef) -> Result<Option<String>> {
        self.conversation_name(conversation)
    }

    fn members_of(&self, conversation: ConversationRef) -> Result<Option<Vec<UserId>>> {
        Database::members_of(self, conversation)
    }

    fn owners_of(&self, conversation: ConversationRef) -> Result<Option<Vec<UserId>>> {
        Database::owners_of(self, conversation)
    }

    fn handle_of(&self, user_id: UserId) -> Result<Option<String>> {
        Database::handle_of(self, user_id)
    }

    fn is_global_owner(&self, user_id: UserId) -> Result<bool> {
        Database::is_global_owner(self, user_id)
    }
}

impl NotificationSink for Database {
    fn notify(&self, user_id: UserId, notification: Notification) -> Result<()> {
        self.push_notification(user_id, notification)
    }
}
