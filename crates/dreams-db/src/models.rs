//! Store row types. These are the store's own records; the wire shapes live in
//! dreams-types so the store stays independent of the HTTP surface.
use std::collections::{BTreeMap, HashMap, VecDeque};

use dreams_types::models::{
    ChannelId, ConversationRef, DmId, GlobalRole, Message, MessageId, Notification, UserId,
};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: UserId,
    pub email: String,
    pub password: String,
    pub name_first: String,
    pub name_last: String,
    pub handle: String,
    pub role: GlobalRole,
    /// Removed by a global owner. The row stays so old identifiers resolve.
    pub is_removed: bool,
}

#[derive(Debug, Clone)]
pub struct ChannelRow {
    pub id: ChannelId,
    pub name: String,
    pub is_public: bool,
    pub owner_members: Vec<UserId>,
    pub all_members: Vec<UserId>,
}

#[derive(Debug, Clone)]
pub struct DmRow {
    pub id: DmId,
    pub name: String,
    /// The DM's only owner. Kept even if the creator later leaves `members`.
    pub creator: Option<UserId>,
    pub members: Vec<UserId>,
}

impl DmRow {
    pub fn creator(&self) -> Option<UserId> {
        self.creator
    }
}

#[derive(Debug, Clone)]
pub struct StandupRow {
    pub starter: UserId,
    pub time_finish: i64,
    pub buffer: Vec<String>,
}

/// All tables of the store. Conversation views hold message identifiers in
/// send order; the message bodies live only in `messages`.
#[derive(Debug)]
pub struct State {
    pub(crate) users: BTreeMap<UserId, UserRow>,
    pub(crate) sessions: HashMap<Uuid, UserId>,
    pub(crate) notifications: HashMap<UserId, VecDeque<Notification>>,
    pub(crate) channels: BTreeMap<ChannelId, ChannelRow>,
    pub(crate) dms: BTreeMap<DmId, DmRow>,
    pub(crate) messages: HashMap<MessageId, Message>,
    pub(crate) views: HashMap<ConversationRef, Vec<MessageId>>,
    pub(crate) standups: HashMap<ConversationRef, StandupRow>,
    pub(crate) next_user_id: UserId,
    pub(crate) next_channel_id: ChannelId,
    pub(crate) next_dm_id: DmId,
    pub(crate) next_message_id: MessageId,
}

impl Default for State {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            sessions: HashMap::new(),
            notifications: HashMap::new(),
            channels: BTreeMap::new(),
            dms: BTreeMap::new(),
            messages: HashMap::new(),
            views: HashMap::new(),
            standups: HashMap::new(),
            next_user_id: 1,
            next_channel_id: 1,
            next_dm_id: 1,
            next_message_id: 1,
        }
    }
}

impl State {
    pub(crate) fn conversation_exists(&self, conversation: ConversationRef) -> bool {
        match conversation {
            ConversationRef::Channel(id) => self.channels.contains_key(&id),
            ConversationRef::Dm(id) => self.dms.contains_key(&id),
        }
    }
}
