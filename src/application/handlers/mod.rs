//! Command handlers.

pub mod payment;

pub use payment::{
    CheckoutError, ConfirmPaymentCommand, ConfirmPaymentHandler, ConfirmPaymentOutcome,
    StartCheckoutCommand, StartCheckoutHandler, StartCheckoutResult,
};
