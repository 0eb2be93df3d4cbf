//! Session resource cleaners.
//!
//! - `NoopCleaner` - nothing to release
//! - `SessionClientCache` - one cached downstream client per session, closed
//!   when the session is swept

mod client_cache;

pub use client_cache::{DownstreamClient, SessionClientCache};

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::ports::{CleanupError, SessionResourceCleaner};

/// Cleaner for deployments without per-session downstream clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCleaner;

#[async_trait]
impl SessionResourceCleaner for NoopCleaner {
    async fn release_session(&self, _session_id: &SessionId) -> Result<(), CleanupError> {
        Ok(())
    }
}
