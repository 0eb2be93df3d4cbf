//! Adapters - Implementations of port interfaces and session infrastructure.
//!
//! - `rate_limiter` - in-process admission control
//! - `session` - lock table, record registry and sweeper
//! - `cleanup` - downstream resource cleaners
//! - `payment` - payment provider implementations

pub mod cleanup;
pub mod payment;
pub mod rate_limiter;
pub mod session;

pub use cleanup::{DownstreamClient, NoopCleaner, SessionClientCache};
pub use payment::MockPaymentProvider;
pub use rate_limiter::{AdmissionConfig, AdmissionController};
pub use session::{SessionGuard, SessionLockTable, SessionStateRegistry, SessionSweeper, SweeperHandle};
