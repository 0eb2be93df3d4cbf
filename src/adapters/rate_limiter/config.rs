//! Admission control configuration.
//!
//! Rates are expressed per minute, as operators think of them; buckets hold a
//! minute's worth of tokens and refill continuously.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ValidationError;

/// Complete admission configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Permitted requests per minute for one session.
    #[serde(default = "default_session_rpm")]
    pub session_requests_per_minute: u32,

    /// Permitted requests per minute across every session.
    #[serde(default = "default_global_rpm")]
    pub global_requests_per_minute: u32,

    /// Maximum admitted requests per trailing burst window.
    #[serde(default = "default_burst_threshold")]
    pub burst_threshold: usize,

    /// Length of the trailing burst window in seconds.
    #[serde(default = "default_burst_window")]
    pub burst_window_secs: u64,
}

/// Capacity and refill rate for one bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketLimits {
    pub capacity: f64,
    /// Tokens per second.
    pub refill_rate: f64,
}

impl BucketLimits {
    /// A bucket that holds one minute of traffic at `per_minute`.
    pub fn per_minute(per_minute: u32) -> Self {
        Self {
            capacity: f64::from(per_minute),
            refill_rate: f64::from(per_minute) / 60.0,
        }
    }
}

impl AdmissionConfig {
    pub fn session_bucket(&self) -> BucketLimits {
        BucketLimits::per_minute(self.session_requests_per_minute)
    }

    pub fn global_bucket(&self) -> BucketLimits {
        BucketLimits::per_minute(self.global_requests_per_minute)
    }

    pub fn burst_window(&self) -> Duration {
        Duration::from_secs(self.burst_window_secs)
    }

    /// Validate admission configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.session_requests_per_minute == 0 {
            return Err(ValidationError::InvalidRate("session"));
        }
        if self.global_requests_per_minute == 0 {
            return Err(ValidationError::InvalidRate("global"));
        }
        if self.burst_threshold == 0 || self.burst_window_secs == 0 {
            return Err(ValidationError::InvalidBurstGuard);
        }
        Ok(())
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            session_requests_per_minute: default_session_rpm(),
            global_requests_per_minute: default_global_rpm(),
            burst_threshold: default_burst_threshold(),
            burst_window_secs: default_burst_window(),
        }
    }
}

fn default_session_rpm() -> u32 {
    60
}

fn default_global_rpm() -> u32 {
    1200
}

fn default_burst_threshold() -> usize {
    10
}

fn default_burst_window() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AdmissionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.burst_window(), Duration::from_secs(10));
    }

    #[test]
    fn bucket_holds_one_minute_of_traffic() {
        let limits = BucketLimits::per_minute(120);
        assert_eq!(limits.capacity, 120.0);
        assert_eq!(limits.refill_rate, 2.0);
    }

    #[test]
    fn zero_rates_are_rejected() {
        let config = AdmissionConfig {
            global_requests_per_minute: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidRate("global")));
    }

    #[test]
    fn zero_burst_threshold_is_rejected() {
        let config = AdmissionConfig {
            burst_threshold: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidBurstGuard));
    }

    #[test]
    fn config_serializes_to_json() {
        let json = serde_json::to_string(&AdmissionConfig::default()).unwrap();
        assert!(json.contains("\"session_requests_per_minute\":60"));
    }
}
