//! Payment provider port for outbound payment links.
//!
//! The provider is an external collaborator. Its calls happen strictly outside
//! session locks; results are fed back through the ledger.
//!
//! # Design
//!
//! - **Gateway agnostic**: any hosted-checkout provider fits
//! - **Idempotent**: link creation carries the attempt's idempotency token
//! - **Polled**: confirmation is read back with `fetch_status`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, IdempotencyToken, Money, SessionId};

/// Port for payment provider integrations.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a hosted payment link for the amount due.
    ///
    /// Repeating the call with the same idempotency token must return the
    /// same link rather than create a second charge.
    async fn create_payment_link(
        &self,
        request: PaymentLinkRequest,
    ) -> Result<PaymentLink, PaymentError>;

    /// Read the provider-side status of a previously created link.
    async fn fetch_status(&self, reference: &str) -> Result<ProviderPaymentStatus, PaymentError>;
}

/// Request to create a payment link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLinkRequest {
    pub session_id: SessionId,
    /// Tab plus tip at the time of the request.
    pub amount: Money,
    pub idempotency_token: IdempotencyToken,
    pub description: Option<String>,
}

/// A created payment link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLink {
    /// Provider's reference for the payment.
    pub reference: String,
    /// URL the guest opens to pay.
    pub url: String,
}

/// Provider-side status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderPaymentStatus {
    /// Link issued, not yet paid.
    Open,
    /// Funds captured.
    Paid,
    /// Payment declined or link expired.
    Failed,
}

/// Payment provider errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("payment reference not found: {0}")]
    NotFound(String),

    #[error("payment provider unavailable: {0}")]
    Unavailable(String),

    #[error("payment provider rejected the request: {0}")]
    Rejected(String),
}

impl PaymentError {
    pub fn not_found(reference: impl Into<String>) -> Self {
        PaymentError::NotFound(reference.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        PaymentError::Unavailable(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        PaymentError::Rejected(msg.into())
    }
}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        DomainError::new(ErrorCode::PaymentProviderError, err.to_string())
    }
}
