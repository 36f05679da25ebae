use tracing::info;

use dreams_db::queries::AdminRefusal;
use dreams_types::events::DreamsEvent;
use dreams_types::models::{GlobalRole, UserId};

use crate::conversations::unknown_user;
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};

impl Engine {
    /// Set a user's platform role from its wire permission id (1 owner, 2 member).
    pub fn admin_userpermission_change(&self, token: &str, u_id: UserId, permission_id: u32) -> EngineResult<()> {
        let user_id = self.authenticate(token)?;
        if !self.inner.store.is_active_user(u_id)? {
            return Err(unknown_user(u_id));
        }
        let role = GlobalRole::from_permission_id(permission_id).ok_or_else(|| {
            EngineError::validation(format!("Unknown permission id {}", permission_id))
        })?;
        self.require_global_owner(user_id)?;

        self.inner
            .store
            .set_role(u_id, role)?
            .map_err(|refusal| refused(refusal, u_id))?;
        info!("User {} set the role of user {} to {:?}", user_id, u_id, role);
        Ok(())
    }

    /// Take a user off the platform. Their messages read "Removed user" from
    /// then on, and anything they still had scheduled is cancelled.
    pub fn admin_user_remove(&self, token: &str, u_id: UserId) -> EngineResult<()> {
        let user_id = self.authenticate(token)?;
        if !self.inner.store.is_active_user(u_id)? {
            return Err(unknown_user(u_id));
        }
        self.require_global_owner(user_id)?;

        let removal = self
            .inner
            .store
            .remove_user(u_id)?
            .map_err(|refusal| refused(refusal, u_id))?;
        let cancelled = self.inner.scheduler.cancel_owned_by(u_id)?;

        for &(message_id, conversation) in &removal.rewritten {
            self.publish(DreamsEvent::MessageEdit {
                message_id,
                conversation,
            });
        }
        info!(
            "User {} removed user {} ({} messages rewritten, {} pending tasks cancelled)",
            user_id,
            u_id,
            removal.rewritten.len(),
            cancelled
        );
        Ok(())
    }

    fn require_global_owner(&self, user_id: UserId) -> EngineResult<()> {
        if self.inner.directory.is_global_owner(user_id)? {
            Ok(())
        } else {
            Err(EngineError::auth(format!("User {} is not a global owner", user_id)))
        }
    }
}

fn refused(refusal: AdminRefusal, u_id: UserId) -> EngineError {
    match refusal {
        AdminRefusal::UnknownUser => unknown_user(u_id),
        AdminRefusal::LastOwner => {
            EngineError::validation(format!("User {} is the only global owner", u_id))
        }
    }
}
