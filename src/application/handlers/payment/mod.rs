//! Payment handlers - checkout and confirmation.
//!
//! Both handlers bracket provider calls between two short holds of the session
//! lock. Nothing is held while the provider is called.

mod confirm_payment;
mod start_checkout;

pub use confirm_payment::{ConfirmPaymentCommand, ConfirmPaymentHandler, ConfirmPaymentOutcome};
pub use start_checkout::{StartCheckoutCommand, StartCheckoutHandler, StartCheckoutResult};

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::payment::LedgerError;
use crate::ports::PaymentError;

/// Errors surfaced by the payment handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Provider(#[from] PaymentError),
}

impl CheckoutError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CheckoutError::Ledger(e) => e.code(),
            CheckoutError::Provider(_) => ErrorCode::PaymentProviderError,
        }
    }
}

impl From<CheckoutError> for DomainError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Ledger(e) => e.into(),
            CheckoutError::Provider(e) => e.into(),
        }
    }
}
