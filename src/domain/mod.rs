//! Domain layer - pure types and rules, no locking and no I/O.

pub mod foundation;
pub mod payment;
pub mod session;
