use std::fmt;

use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type ChannelId = u64;
pub type DmId = u64;
pub type MessageId = u64;

/// The only reaction kind the platform understands ("like").
pub const REACT_LIKE: u32 = 1;

/// Wire value used by the HTTP surface for "no channel" / "no DM".
pub const NO_CONVERSATION: i64 = -1;

/// A message lives in exactly one conversation: a channel or a DM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ConversationRef {
    Channel(ChannelId),
    Dm(DmId),
}

impl ConversationRef {
    pub fn channel_id(&self) -> i64 {
        match self {
            Self::Channel(id) => *id as i64,
            Self::Dm(_) => NO_CONVERSATION,
        }
    }

    pub fn dm_id(&self) -> i64 {
        match self {
            Self::Channel(_) => NO_CONVERSATION,
            Self::Dm(id) => *id as i64,
        }
    }
}

impl fmt::Display for ConversationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(id) => write!(f, "channel {}", id),
            Self::Dm(id) => write!(f, "dm {}", id),
        }
    }
}

/// Platform-wide permission level. The first registered user owns the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalRole {
    Owner,
    Member,
}

impl GlobalRole {
    /// Wire permission ids: 1 for an owner, 2 for a member.
    pub fn from_permission_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Self::Owner),
            2 => Some(Self::Member),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub react_id: u32,
    /// Reacting users, in the order they reacted.
    pub u_ids: Vec<UserId>,
}

/// Canonical message record held by the global index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub author_id: UserId,
    pub body: String,
    pub created_at: i64,
    pub conversation: ConversationRef,
    pub is_removed: bool,
    pub was_shared: bool,
    pub is_pinned: bool,
    pub reactions: Vec<Reaction>,
}

impl Message {
    pub fn new(
        message_id: MessageId,
        author_id: UserId,
        conversation: ConversationRef,
        body: String,
        was_shared: bool,
    ) -> Self {
        Self {
            message_id,
            author_id,
            body,
            created_at: chrono::Utc::now().timestamp(),
            conversation,
            is_removed: false,
            was_shared,
            is_pinned: false,
            reactions: Vec::new(),
        }
    }

    pub fn has_reacted(&self, react_id: u32, user_id: UserId) -> bool {
        self.reactions
            .iter()
            .any(|r| r.react_id == react_id && r.u_ids.contains(&user_id))
    }

    /// Returns false if the user already holds this reaction.
    pub fn add_reaction(&mut self, react_id: u32, user_id: UserId) -> bool {
        if self.has_reacted(react_id, user_id) {
            return false;
        }
        match self.reactions.iter_mut().find(|r| r.react_id == react_id) {
            Some(reaction) => reaction.u_ids.push(user_id),
            None => self.reactions.push(Reaction {
                react_id,
                u_ids: vec![user_id],
            }),
        }
        true
    }

    /// Returns false if the user did not hold this reaction. Drops the entry once
    /// its last user is gone.
    pub fn remove_reaction(&mut self, react_id: u32, user_id: UserId) -> bool {
        let Some(idx) = self.reactions.iter().position(|r| r.react_id == react_id) else {
            return false;
        };
        let reaction = &mut self.reactions[idx];
        let Some(pos) = reaction.u_ids.iter().position(|u| *u == user_id) else {
            return false;
        };
        reaction.u_ids.remove(pos);
        if reaction.u_ids.is_empty() {
            self.reactions.remove(idx);
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub conversation: ConversationRef,
    pub text: String,
}
