//! Application layer - the ledger, the service facade and command handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;
mod ledger;
mod tab_service;

pub use handlers::{
    CheckoutError, ConfirmPaymentCommand, ConfirmPaymentHandler, ConfirmPaymentOutcome,
    StartCheckoutCommand, StartCheckoutHandler, StartCheckoutResult,
};
pub use ledger::{OrderReceipt, PaymentLedger};
pub use tab_service::TabService;
