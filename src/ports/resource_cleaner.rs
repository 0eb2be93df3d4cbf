//! Port for releasing downstream resources tied to a session.
//!
//! The sweeper calls this after a session's locks and buckets are gone. It is
//! the only place the sweeper performs I/O, and no lock is held across it.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{ErrorCode, SessionId};

/// Releases cached downstream clients (LLM, speech, retrieval) for a session.
#[async_trait]
pub trait SessionResourceCleaner: Send + Sync {
    async fn release_session(&self, session_id: &SessionId) -> Result<(), CleanupError>;
}

/// Errors raised while releasing session resources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CleanupError {
    /// Worth retrying (timeouts, connection resets).
    #[error("transient cleanup failure: {0}")]
    Transient(String),

    /// Retrying will not help.
    #[error("cleanup failed: {0}")]
    Permanent(String),
}

impl CleanupError {
    pub fn transient(msg: impl Into<String>) -> Self {
        CleanupError::Transient(msg.into())
    }

    pub fn permanent(msg: impl Into<String>) -> Self {
        CleanupError::Permanent(msg.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, CleanupError::Transient(_))
    }

    pub fn code(&self) -> ErrorCode {
        ErrorCode::CleanupFailed
    }
}
