use thiserror::Error;
use tracing::error;

/// Failure kinds surfaced by every engine operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad or expired token, or the caller lacks the membership/ownership the
    /// operation needs.
    #[error("access denied: {0}")]
    Auth(String),
    /// Malformed or out-of-range input, unknown targets, or a no-op state change.
    #[error("invalid input: {0}")]
    Validation(String),
    /// An internal invariant broke. Never expected in correct operation.
    #[error("internal error: {0}")]
    Configuration(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// The description without the kind prefix.
    pub fn description(&self) -> &str {
        match self {
            Self::Auth(msg) | Self::Validation(msg) | Self::Configuration(msg) => msg,
        }
    }
}

/// Store failures (lock poisoning, missing conversation on create) are defects:
/// log them and fail the operation closed.
impl From<anyhow::Error> for EngineError {
    fn from(e: anyhow::Error) -> Self {
        error!("Store failure: {:#}", e);
        Self::Configuration(e.to_string())
    }
}
