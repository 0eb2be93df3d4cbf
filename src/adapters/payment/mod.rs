//! Payment provider adapters.
//!
//! Only the mock ships here; real gateways plug in behind the same
//! `PaymentProvider` port.

mod mock_payment_provider;

pub use mock_payment_provider::{MethodCall, MockPaymentProvider};
