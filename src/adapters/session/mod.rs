//! Session adapters: the lock table, the record registry and the sweeper.
//!
//! Lock order is always table mutex, released, then session mutex. Registry
//! shards and admission state are only touched with the session mutex held or
//! from the sweeper's retire step.

mod lock_table;
mod registry;
mod sweeper;

pub use lock_table::{SessionGuard, SessionLockTable};
pub use registry::SessionStateRegistry;
pub use sweeper::{SessionSweeper, SweepReport, SweeperConfig, SweeperHandle};
