//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `SESSION_LEDGER` prefix and
//! nested values are separated by double underscores. Every section has
//! defaults, so an empty environment yields a working configuration.
//!
//! # Example
//!
//! ```no_run
//! use session_ledger::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Session ceiling: {}", config.session.max_sessions);
//! ```

mod error;
mod ledger;
mod logging;
mod session;

pub use crate::adapters::rate_limiter::AdmissionConfig;
pub use error::{ConfigError, ValidationError};
pub use ledger::LedgerConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use session::SessionConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Token buckets and burst guard
    #[serde(default)]
    pub admission: AdmissionConfig,

    /// Session ceiling, idle expiry and sweeper cadence
    #[serde(default)]
    pub session: SessionConfig,

    /// Payment ledger defaults
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SESSION_LEDGER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SESSION_LEDGER__SESSION__MAX_SESSIONS=500` -> `session.max_sessions = 500`
    /// - `SESSION_LEDGER__LEDGER__STARTING_BALANCE=250.00` -> `ledger.starting_balance`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SESSION_LEDGER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.admission.validate()?;
        self.session.validate()?;
        self.ledger.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
