//! Payment domain - the per-session tab and its payment attempt.
//!
//! ## Invariants
//!
//! - `balance ≥ 0` and `tab_total ≥ 0`
//! - `version` increases by exactly one on every successful mutation
//! - `payment_status` only moves forward, except through `reset_payment`
//! - `tip_amount` equals `tab_total × tip / 100` when a tip is set, else zero

mod errors;
mod record;
mod status;
mod tip;

pub use errors::LedgerError;
pub use record::{ChargeReceipt, PaymentRecord, TipSummary};
pub use status::PaymentStatus;
pub use tip::TipPercentage;
