use tracing::info;

use dreams_types::api::{ChannelDetails, DmDetails, NotificationView};
use dreams_types::models::{ChannelId, ConversationRef, DmId, UserId};

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};

const CHANNEL_NAME_MAX_LEN: usize = 20;

impl Engine {
    // -- Channels --

    /// Create a channel owned by the caller.
    pub fn channels_create(&self, token: &str, name: &str, is_public: bool) -> EngineResult<ChannelId> {
        let user_id = self.authenticate(token)?;
        let len = name.chars().count();
        if len == 0 || len > CHANNEL_NAME_MAX_LEN {
            return Err(EngineError::validation(format!(
                "Channel name must be 1 to {} characters",
                CHANNEL_NAME_MAX_LEN
            )));
        }

        let channel_id = self.inner.store.create_channel(name, is_public, user_id)?;
        info!("User {} created channel {} ({})", user_id, channel_id, name);
        Ok(channel_id)
    }

    pub fn channel_join(&self, token: &str, channel_id: ChannelId) -> EngineResult<()> {
        let user_id = self.authenticate(token)?;
        let channel = self
            .inner
            .store
            .get_channel(channel_id)?
            .ok_or_else(|| unknown_channel(channel_id))?;
        if channel.all_members.contains(&user_id) {
            return Err(EngineError::validation(format!(
                "User {} is already in channel {}",
                user_id, channel_id
            )));
        }
        if !channel.is_public && !self.inner.directory.is_global_owner(user_id)? {
            return Err(EngineError::auth(format!("Channel {} is private", channel_id)));
        }

        self.inner.store.add_channel_member(channel_id, user_id)?;
        info!("User {} joined channel {}", user_id, channel_id);
        Ok(())
    }

    /// Add another user to a channel the caller belongs to. The invitee is notified.
    pub fn channel_invite(&self, token: &str, channel_id: ChannelId, invitee: UserId) -> EngineResult<()> {
        let user_id = self.authenticate(token)?;
        let channel = self
            .inner
            .store
            .get_channel(channel_id)?
            .ok_or_else(|| unknown_channel(channel_id))?;
        if !self.inner.store.is_active_user(invitee)? {
            return Err(unknown_user(invitee));
        }
        if !channel.all_members.contains(&user_id) {
            return Err(EngineError::auth(format!(
                "User {} is not a member of channel {}",
                user_id, channel_id
            )));
        }
        if !self.inner.store.add_channel_member(channel_id, invitee)? {
            return Err(EngineError::validation(format!(
                "User {} is already in channel {}",
                invitee, channel_id
            )));
        }

        let conversation = ConversationRef::Channel(channel_id);
        let text = format!("{} added you to {}", self.handle(user_id)?, channel.name);
        self.notify(invitee, conversation, text)?;
        info!("User {} invited user {} to channel {}", user_id, invitee, channel_id);
        Ok(())
    }

    /// Make a channel member an owner. Channel owners and global owners may.
    pub fn channel_addowner(&self, token: &str, channel_id: ChannelId, u_id: UserId) -> EngineResult<()> {
        let user_id = self.authenticate(token)?;
        let channel = self
            .inner
            .store
            .get_channel(channel_id)?
            .ok_or_else(|| unknown_channel(channel_id))?;
        if !self.inner.store.is_active_user(u_id)? {
            return Err(unknown_user(u_id));
        }
        if !channel.all_members.contains(&u_id) {
            return Err(EngineError::validation(format!(
                "User {} is not a member of channel {}",
                u_id, channel_id
            )));
        }
        if channel.owner_members.contains(&u_id) {
            return Err(already_owner(u_id, channel_id));
        }
        let conversation = ConversationRef::Channel(channel_id);
        if !self.is_owner(conversation, user_id)? && !self.inner.directory.is_global_owner(user_id)? {
            return Err(EngineError::auth(format!(
                "User {} does not own channel {}",
                user_id, channel_id
            )));
        }

        if !self.inner.store.add_channel_owner(channel_id, u_id)? {
            // Promoted or removed since the checks above.
            return Err(already_owner(u_id, channel_id));
        }
        info!("User {} made user {} an owner of channel {}", user_id, u_id, channel_id);
        Ok(())
    }

    pub fn channel_details(&self, token: &str, channel_id: ChannelId) -> EngineResult<ChannelDetails> {
        let user_id = self.authenticate(token)?;
        let channel = self
            .inner
            .store
            .get_channel(channel_id)?
            .ok_or_else(|| unknown_channel(channel_id))?;
        self.require_member(ConversationRef::Channel(channel_id), user_id)?;

        Ok(ChannelDetails {
            name: channel.name,
            is_public: channel.is_public,
            owner_members: self.inner.store.user_profiles(&channel.owner_members)?,
            all_members: self.inner.store.user_profiles(&channel.all_members)?,
        })
    }

    // -- DMs --

    /// Open a DM between the caller and `u_ids`. The name lists every member's
    /// handle in sorted order. Returns the new DM and its name.
    pub fn dm_create(&self, token: &str, u_ids: &[UserId]) -> EngineResult<(DmId, String)> {
        let user_id = self.authenticate(token)?;

        let mut members = vec![user_id];
        for &id in u_ids {
            if !self.inner.store.is_active_user(id)? {
                return Err(unknown_user(id));
            }
            if !members.contains(&id) {
                members.push(id);
            }
        }

        let mut handles = Vec::with_capacity(members.len());
        for &id in &members {
            handles.push(self.handle(id)?);
        }
        handles.sort();
        let name = handles.join(", ");

        let dm_id = self.inner.store.create_dm(&name, members.clone())?;
        let conversation = ConversationRef::Dm(dm_id);
        let creator = self.handle(user_id)?;
        for &invitee in &members[1..] {
            self.notify(invitee, conversation, format!("{} added you to {}", creator, name))?;
        }

        info!("User {} created DM {} with {} members", user_id, dm_id, members.len());
        Ok((dm_id, name))
    }

    /// Add another user to a DM the caller belongs to. The DM keeps its name.
    pub fn dm_invite(&self, token: &str, dm_id: DmId, invitee: UserId) -> EngineResult<()> {
        let user_id = self.authenticate(token)?;
        let dm = self
            .inner
            .store
            .get_dm(dm_id)?
            .ok_or_else(|| unknown_dm(dm_id))?;
        if !self.inner.store.is_active_user(invitee)? {
            return Err(unknown_user(invitee));
        }
        if !dm.members.contains(&user_id) {
            return Err(EngineError::auth(format!(
                "User {} is not a member of DM {}",
                user_id, dm_id
            )));
        }
        if !self.inner.store.add_dm_member(dm_id, invitee)? {
            return Err(EngineError::validation(format!(
                "User {} is already in DM {}",
                invitee, dm_id
            )));
        }

        let text = format!("{} added you to {}", self.handle(user_id)?, dm.name);
        self.notify(invitee, ConversationRef::Dm(dm_id), text)?;
        info!("User {} invited user {} to DM {}", user_id, invitee, dm_id);
        Ok(())
    }

    pub fn dm_details(&self, token: &str, dm_id: DmId) -> EngineResult<DmDetails> {
        let user_id = self.authenticate(token)?;
        let dm = self
            .inner
            .store
            .get_dm(dm_id)?
            .ok_or_else(|| unknown_dm(dm_id))?;
        self.require_member(ConversationRef::Dm(dm_id), user_id)?;

        Ok(DmDetails {
            name: dm.name,
            members: self.inner.store.user_profiles(&dm.members)?,
        })
    }

    /// Delete a DM. Only its creator may. Its messages are soft-removed and any
    /// send-later still pending for it fails when it fires.
    pub fn dm_remove(&self, token: &str, dm_id: DmId) -> EngineResult<()> {
        let user_id = self.authenticate(token)?;
        let dm = self
            .inner
            .store
            .get_dm(dm_id)?
            .ok_or_else(|| unknown_dm(dm_id))?;
        if dm.creator() != Some(user_id) {
            return Err(EngineError::auth(format!(
                "Only the creator may remove DM {}",
                dm_id
            )));
        }

        if !self.inner.store.remove_dm(dm_id)? {
            return Err(unknown_dm(dm_id));
        }
        info!("User {} removed DM {}", user_id, dm_id);
        Ok(())
    }

    // -- Notifications --

    /// The caller's most recent notifications, newest first.
    pub fn notifications_get(&self, token: &str) -> EngineResult<Vec<NotificationView>> {
        let user_id = self.authenticate(token)?;
        Ok(self
            .inner
            .store
            .notifications(user_id)?
            .iter()
            .map(NotificationView::from)
            .collect())
    }

    // -- Lifecycle --

    /// Cancel every pending timer and empty the store.
    pub fn clear(&self) -> EngineResult<()> {
        let cancelled = self.inner.scheduler.cancel_all()?;
        self.inner.store.reset()?;
        self.inner.dispatcher.clear_dead_letters();
        info!("Store cleared ({} pending tasks cancelled)", cancelled);
        Ok(())
    }
}

fn unknown_channel(channel_id: ChannelId) -> EngineError {
    EngineError::validation(format!("Channel {} does not exist", channel_id))
}

fn unknown_dm(dm_id: DmId) -> EngineError {
    EngineError::validation(format!("DM {} does not exist", dm_id))
}

fn already_owner(user_id: UserId, channel_id: ChannelId) -> EngineError {
    EngineError::validation(format!("User {} already owns channel {}", user_id, channel_id))
}

pub(crate) fn unknown_user(user_id: UserId) -> EngineError {
    EngineError::validation(format!("User {} does not exist", user_id))
}
