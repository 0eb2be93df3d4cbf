//! Session lifetime configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Session table and sweeper settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Hard ceiling on concurrently tracked sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Seconds without access before a session is swept
    #[serde(default = "default_idle_expiry")]
    pub idle_expiry_secs: u64,

    /// Seconds between sweeper passes
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Extra attempts for transient external-cleanup failures
    #[serde(default = "default_cleanup_retries")]
    pub cleanup_retries: u32,
}

impl SessionConfig {
    pub fn idle_expiry(&self) -> Duration {
        Duration::from_secs(self.idle_expiry_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate session configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_sessions == 0 {
            return Err(ValidationError::InvalidSessionLimit);
        }
        if self.idle_expiry_secs == 0 {
            return Err(ValidationError::InvalidIdleExpiry);
        }
        if self.sweep_interval_secs == 0 || self.sweep_interval_secs > self.idle_expiry_secs {
            return Err(ValidationError::InvalidSweepInterval);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            idle_expiry_secs: default_idle_expiry(),
            sweep_interval_secs: default_sweep_interval(),
            cleanup_retries: default_cleanup_retries(),
        }
    }
}

fn default_max_sessions() -> usize {
    1000
}

fn default_idle_expiry() -> u64 {
    30 * 60
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_cleanup_retries() -> u32 {
    1
}
