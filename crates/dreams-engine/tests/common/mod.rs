#![allow(dead_code)]

use std::sync::Arc;

use dreams_db::Database;
use dreams_engine::{Engine, EngineError, EngineResult, IdentityGate, NotificationSink};
use dreams_types::models::{ConversationRef, UserId};

/// Accepts `token-<user id>` for any registered user not yet removed.
pub struct TestGate {
    db: Arc<Database>,
}

impl IdentityGate for TestGate {
    fn authenticate(&self, token: &str) -> EngineResult<UserId> {
        let user_id = token
            .strip_prefix("token-")
            .and_then(|id| id.parse::<UserId>().ok())
            .ok_or_else(|| EngineError::auth("Malformed token"))?;
        if self.db.is_active_user(user_id)? {
            Ok(user_id)
        } else {
            Err(EngineError::auth("Unknown user"))
        }
    }
}

pub struct User {
    pub id: UserId,
    pub token: String,
}

pub struct Fixture {
    pub db: Arc<Database>,
    pub engine: Engine,
}

impl Fixture {
    pub fn new() -> Self {
        let db = Arc::new(Database::open());
        let gate = Arc::new(TestGate { db: db.clone() });
        let engine = Engine::new(db.clone(), gate);
        Self { db, engine }
    }

    /// Same store and gate, but notifications go to `notifier`.
    pub fn with_notifier(notifier: Arc<dyn NotificationSink>) -> Self {
        let db = Arc::new(Database::open());
        let gate = Arc::new(TestGate { db: db.clone() });
        let engine = Engine::with_collaborators(db.clone(), gate, db.clone(), notifier);
        Self { db, engine }
    }

    pub fn user(&self, first: &str, last: &str) -> User {
        let email = format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase());
        let id = self
            .db
            .create_user(&email, "not-a-real-hash", first, last)
            .unwrap()
            .unwrap();
        User {
            id,
            token: format!("token-{}", id),
        }
    }

    pub fn channel(&self, owner: &User, name: &str) -> ConversationRef {
        ConversationRef::Channel(self.engine.channels_create(&owner.token, name, true).unwrap())
    }

    pub fn dm(&self, creator: &User, others: &[&User]) -> ConversationRef {
        let ids: Vec<UserId> = others.iter().map(|u| u.id).collect();
        let (dm_id, _) = self.engine.dm_create(&creator.token, &ids).unwrap();
        ConversationRef::Dm(dm_id)
    }

    pub fn notification_texts(&self, user: &User) -> Vec<String> {
        self.engine
            .notifications_get(&user.token)
            .unwrap()
            .into_iter()
            .map(|n| n.notification_message)
            .collect()
    }
}

pub fn is_auth<T>(result: EngineResult<T>) -> bool {
    matches!(result, Err(EngineError::Auth(_)))
}

pub fn is_validation<T>(result: EngineResult<T>) -> bool {
    matches!(result, Err(EngineError::Validation(_)))
}
