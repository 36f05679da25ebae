pub mod admin;
pub mod conversations;
pub mod dispatcher;
pub mod edit;
pub mod engine;
pub mod error;
pub mod gate;
pub mod mention;
pub mod pin;
pub mod quote;
pub mod react;
pub mod scheduler;
pub mod send;
pub mod standup;

pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use gate::{ConversationDirectory, IdentityGate, NotificationSink};
