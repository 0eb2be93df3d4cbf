//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Request rate for {0} must be greater than zero")]
    InvalidRate(&'static str),

    #[error("Burst threshold and window must be greater than zero")]
    InvalidBurstGuard,

    #[error("Maximum concurrent sessions must be greater than zero")]
    InvalidSessionLimit,

    #[error("Idle expiry must be greater than zero")]
    InvalidIdleExpiry,

    #[error("Sweep interval must be greater than zero and no longer than the idle expiry")]
    InvalidSweepInterval,

    #[error("Starting balance must be between zero and 1e15")]
    InvalidStartingBalance,

    #[error("Invalid log filter directive: {0}")]
    InvalidLogFilter(String),
}
