use crate::Database;
use crate::models::{ChannelRow, DmRow, State, UserRow};
use anyhow::Result;
use dreams_types::api::UserProfile;
use dreams_types::models::{
    ChannelId, ConversationRef, DmId, GlobalRole, MessageId, Notification, UserId,
};
use uuid::Uuid;

/// Per-user notification queue length; older entries are evicted first.
pub const NOTIFICATION_LIMIT: usize = 20;

const HANDLE_MAX_LEN: usize = 20;

/// What a removed user's name and message bodies are replaced with.
pub const REMOVED_USER: &str = "Removed user";

/// Why an admin change to a user was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminRefusal {
    /// No such user, or already removed
    UnknownUser,
    /// The change would leave the platform without a global owner
    LastOwner,
}

/// Messages rewritten by `remove_user`, for event fan-out.
#[derive(Debug, Default)]
pub struct UserRemoval {
    pub rewritten: Vec<(MessageId, ConversationRef)>,
}

impl Database {
    // -- Users --

    /// Insert a user and derive a unique handle. Returns `None` if the email is taken.
    /// The first user ever registered owns the platform.
    pub fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name_first: &str,
        name_last: &str,
    ) -> Result<Option<UserId>> {
        self.with_state_mut(|state| {
            if state.users.values().any(|u| !u.is_removed && u.email == email) {
                return Ok(None);
            }

            let id = state.next_user_id;
            state.next_user_id += 1;

            let role = if state.users.is_empty() {
                GlobalRole::Owner
            } else {
                GlobalRole::Member
            };
            let handle = allocate_handle(state, name_first, name_last);

            state.users.insert(
                id,
                UserRow {
                    id,
                    email: email.to_string(),
                    password: password_hash.to_string(),
                    name_first: name_first.to_string(),
                    name_last: name_last.to_string(),
                    handle,
                    role,
                    is_removed: false,
                },
            );
            Ok(Some(id))
        })
    }

    pub fn get_user(&self, id: UserId) -> Result<Option<UserRow>> {
        self.with_state(|state| Ok(state.users.get(&id).cloned()))
    }

    /// Only users still on the platform can be found by email.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_state(|state| {
            Ok(state
                .users
                .values()
                .find(|u| !u.is_removed && u.email == email)
                .cloned())
        })
    }

    pub fn is_active_user(&self, id: UserId) -> Result<bool> {
        self.with_state(|state| Ok(state.users.get(&id).is_some_and(|u| !u.is_removed)))
    }

    /// Change a user's global role. Refuses to demote the last global owner.
    pub fn set_role(&self, id: UserId, role: GlobalRole) -> Result<Result<(), AdminRefusal>> {
        self.with_state_mut(|state| {
            let current = match state.users.get(&id) {
                Some(user) if !user.is_removed => user.role,
                _ => return Ok(Err(AdminRefusal::UnknownUser)),
            };
            if current == GlobalRole::Owner && role != GlobalRole::Owner && owner_count(state) == 1 {
                return Ok(Err(AdminRefusal::LastOwner));
            }
            if let Some(user) = state.users.get_mut(&id) {
                user.role = role;
            }
            Ok(Ok(()))
        })
    }

    /// Take a user off the platform in one critical section: their sessions,
    /// memberships, notifications and open standups go, their profile name and
    /// every message they wrote become "Removed user". The last global owner
    /// cannot be removed.
    pub fn remove_user(&self, id: UserId) -> Result<Result<UserRemoval, AdminRefusal>> {
        self.with_state_mut(|state| {
            let role = match state.users.get(&id) {
                Some(user) if !user.is_removed => user.role,
                _ => return Ok(Err(AdminRefusal::UnknownUser)),
            };
            if role == GlobalRole::Owner && owner_count(state) == 1 {
                return Ok(Err(AdminRefusal::LastOwner));
            }

            if let Some(user) = state.users.get_mut(&id) {
                user.is_removed = true;
                user.name_first = "Removed".to_string();
                user.name_last = "user".to_string();
            }
            state.sessions.retain(|_, user_id| *user_id != id);
            state.notifications.remove(&id);
            for channel in state.channels.values_mut() {
                channel.all_members.retain(|&m| m != id);
                channel.owner_members.retain(|&m| m != id);
            }
            for dm in state.dms.values_mut() {
                dm.members.retain(|&m| m != id);
            }
            state.standups.retain(|_, standup| standup.starter != id);

            let mut removal = UserRemoval::default();
            for message in state.messages.values_mut().filter(|m| m.author_id == id) {
                message.body = REMOVED_USER.to_string();
                removal.rewritten.push((message.message_id, message.conversation));
            }
            removal.rewritten.sort_unstable_by_key(|(message_id, _)| *message_id);
            Ok(Ok(removal))
        })
    }

    pub fn user_profiles(&self, ids: &[UserId]) -> Result<Vec<UserProfile>> {
        self.with_state(|state| {
            Ok(ids
                .iter()
                .filter_map(|id| state.users.get(id))
                .map(profile_of)
                .collect())
        })
    }

    // -- Sessions --

    pub fn create_session(&self, user_id: UserId) -> Result<Uuid> {
        self.with_state_mut(|state| {
            let sid = Uuid::new_v4();
            state.sessions.insert(sid, user_id);
            Ok(sid)
        })
    }

    pub fn session_user(&self, sid: &Uuid) -> Result<Option<UserId>> {
        self.with_state(|state| Ok(state.sessions.get(sid).copied()))
    }

    pub fn end_session(&self, sid: &Uuid) -> Result<bool> {
        self.with_state_mut(|state| Ok(state.sessions.remove(sid).is_some()))
    }

    // -- Channels --

    pub fn create_channel(&self, name: &str, is_public: bool, creator: UserId) -> Result<ChannelId> {
        self.with_state_mut(|state| {
            let id = state.next_channel_id;
            state.next_channel_id += 1;
            state.channels.insert(
                id,
                ChannelRow {
                    id,
                    name: name.to_string(),
                    is_public,
                    owner_members: vec![creator],
                    all_members: vec![creator],
                },
            );
            state.views.insert(ConversationRef::Channel(id), Vec::new());
            Ok(id)
        })
    }

    pub fn get_channel(&self, id: ChannelId) -> Result<Option<ChannelRow>> {
        self.with_state(|state| Ok(state.channels.get(&id).cloned()))
    }

    /// Returns false if the user was already a member (or the channel is gone).
    pub fn add_channel_member(&self, channel_id: ChannelId, user_id: UserId) -> Result<bool> {
        self.with_state_mut(|state| {
            let Some(channel) = state.channels.get_mut(&channel_id) else {
                return Ok(false);
            };
            if channel.all_members.contains(&user_id) {
                return Ok(false);
            }
            channel.all_members.push(user_id);
            Ok(true)
        })
    }

    /// Promote a channel member to owner. Returns false if the user is not a
    /// member or already an owner.
    pub fn add_channel_owner(&self, channel_id: ChannelId, user_id: UserId) -> Result<bool> {
        self.with_state_mut(|state| {
            let Some(channel) = state.channels.get_mut(&channel_id) else {
                return Ok(false);
            };
            if !channel.all_members.contains(&user_id) || channel.owner_members.contains(&user_id) {
                return Ok(false);
            }
            channel.owner_members.push(user_id);
            Ok(true)
        })
    }

    // -- DMs --

    /// `members` must list the creator first.
    pub fn create_dm(&self, name: &str, members: Vec<UserId>) -> Result<DmId> {
        self.with_state_mut(|state| {
            let id = state.next_dm_id;
            state.next_dm_id += 1;
            state.dms.insert(
                id,
                DmRow {
                    id,
                    name: name.to_string(),
                    creator: members.first().copied(),
                    members,
                },
            );
            state.views.insert(ConversationRef::Dm(id), Vec::new());
            Ok(id)
        })
    }

    pub fn get_dm(&self, id: DmId) -> Result<Option<DmRow>> {
        self.with_state(|state| Ok(state.dms.get(&id).cloned()))
    }

    /// Returns false if the user was already a member (or the DM is gone).
    pub fn add_dm_member(&self, dm_id: DmId, user_id: UserId) -> Result<bool> {
        self.with_state_mut(|state| {
            let Some(dm) = state.dms.get_mut(&dm_id) else {
                return Ok(false);
            };
            if dm.members.contains(&user_id) {
                return Ok(false);
            }
            dm.members.push(user_id);
            Ok(true)
        })
    }

    /// Delete a DM. Its messages stay in the global index, soft-removed, so their
    /// identifiers keep resolving. Returns false if the DM did not exist.
    pub fn remove_dm(&self, id: DmId) -> Result<bool> {
        self.with_state_mut(|state| {
            if state.dms.remove(&id).is_none() {
                return Ok(false);
            }
            let conversation = ConversationRef::Dm(id);
            for message_id in state.views.remove(&conversation).unwrap_or_default() {
                if let Some(message) = state.messages.get_mut(&message_id) {
                    message.is_removed = true;
                }
            }
            state.standups.remove(&conversation);
            Ok(true)
        })
    }

    // -- Conversations (channel or DM) --

    pub fn conversation_exists(&self, conversation: ConversationRef) -> Result<bool> {
        self.with_state(|state| Ok(state.conversation_exists(conversation)))
    }

    pub fn conversation_name(&self, conversation: ConversationRef) -> Result<Option<String>> {
        self.with_state(|state| {
            Ok(match conversation {
                ConversationRef::Channel(id) => state.channels.get(&id).map(|c| c.name.clone()),
                ConversationRef::Dm(id) => state.dms.get(&id).map(|d| d.name.clone()),
            })
        })
    }

    pub fn members_of(&self, conversation: ConversationRef) -> Result<Option<Vec<UserId>>> {
        self.with_state(|state| {
            Ok(match conversation {
                ConversationRef::Channel(id) => state.channels.get(&id).map(|c| c.all_members.clone()),
                ConversationRef::Dm(id) => state.dms.get(&id).map(|d| d.members.clone()),
            })
        })
    }

    /// Channel owners, or the creator of a DM.
    pub fn owners_of(&self, conversation: ConversationRef) -> Result<Option<Vec<UserId>>> {
        self.with_state(|state| {
            Ok(match conversation {
                ConversationRef::Channel(id) => {
                    state.channels.get(&id).map(|c| c.owner_members.clone())
                }
                ConversationRef::Dm(id) => state
                    .dms
                    .get(&id)
                    .map(|d| d.creator().into_iter().collect()),
            })
        })
    }

    pub fn handle_of(&self, user_id: UserId) -> Result<Option<String>> {
        self.with_state(|state| Ok(state.users.get(&user_id).map(|u| u.handle.clone())))
    }

    pub fn is_global_owner(&self, user_id: UserId) -> Result<bool> {
        self.with_state(|state| {
            Ok(state
                .users
                .get(&user_id)
                .is_some_and(|u| u.role == GlobalRole::Owner))
        })
    }

    // -- Notifications --

    pub fn push_notification(&self, user_id: UserId, notification: Notification) -> Result<()> {
        self.with_state_mut(|state| {
            let queue = state.notifications.entry(user_id).or_default();
            queue.push_back(notification);
            while queue.len() > NOTIFICATION_LIMIT {
                queue.pop_front();
            }
            Ok(())
        })
    }

    /// Most recent first.
    pub fn notifications(&self, user_id: UserId) -> Result<Vec<Notification>> {
        self.with_state(|state| {
            Ok(state
                .notifications
                .get(&user_id)
                .map(|q| q.iter().rev().cloned().collect())
                .unwrap_or_default())
        })
    }
}

fn owner_count(state: &State) -> usize {
    state
        .users
        .values()
        .filter(|u| !u.is_removed && u.role == GlobalRole::Owner)
        .count()
}

fn profile_of(user: &UserRow) -> UserProfile {
    UserProfile {
        u_id: user.id,
        email: user.email.clone(),
        name_first: user.name_first.clone(),
        name_last: user.name_last.clone(),
        handle_str: user.handle.clone(),
    }
}

/// Lowercased alphanumerics of first+last name, cut to 20 characters. Collisions
/// get the smallest free numeric suffix, starting at 0.
fn allocate_handle(state: &State, name_first: &str, name_last: &str) -> String {
    let base: String = name_first
        .chars()
        .chain(name_last.chars())
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .take(HANDLE_MAX_LEN)
        .collect();

    // Handles of removed users are free for reuse.
    let taken = |candidate: &str| {
        state
            .users
            .values()
            .any(|u| !u.is_removed && u.handle == candidate)
    };
    if !base.is_empty() && !taken(&base) {
        return base;
    }
    (0u64..)
        .map(|n| format!("{}{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or(base)
}
