//! Rate limiter adapters.
//!
//! In-process implementation of the `AdmissionGate` port: a token bucket per
//! session, one shared bucket, and a trailing-window burst guard.
//!
//! ## Usage
//!
//! ```ignore
//! use session_ledger::adapters::rate_limiter::{AdmissionConfig, AdmissionController};
//!
//! let gate = AdmissionController::new(AdmissionConfig::default(), 1000);
//! if gate.check(&session_id).is_allowed() { /* proceed */ }
//! ```

mod burst_window;
mod config;
mod in_memory;
mod token_bucket;

pub use burst_window::BurstWindow;
pub use config::{AdmissionConfig, BucketLimits};
pub use in_memory::AdmissionController;
pub use token_bucket::TokenBucket;
