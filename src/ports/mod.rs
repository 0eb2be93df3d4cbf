//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between the
//! session core and the outside world. Adapters implement these ports.
//!
//! - `AdmissionGate` - token-bucket and burst admission control
//! - `SessionResourceCleaner` - releases downstream clients of expired sessions
//! - `PaymentProvider` - outbound payment links and their confirmation

mod payment_provider;
mod rate_limiter;
mod resource_cleaner;

pub use payment_provider::{
    PaymentError, PaymentLink, PaymentLinkRequest, PaymentProvider, ProviderPaymentStatus,
};
pub use rate_limiter::{AdmissionDecision, AdmissionDenied, AdmissionGate, AdmissionStatus, DenyReason};
pub use resource_cleaner::{CleanupError, SessionResourceCleaner};
