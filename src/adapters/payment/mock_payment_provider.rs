//! Mock payment provider for testing.
//!
//! Provides a configurable implementation of `PaymentProvider` for unit and
//! integration tests. Supports:
//! - Idempotent link creation keyed on the idempotency token
//! - Scripted provider-side statuses
//! - Error injection
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::ports::{
    PaymentError, PaymentLink, PaymentLinkRequest, PaymentProvider, ProviderPaymentStatus,
};

/// Mock payment provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockPaymentProvider::new();
///
/// // Script the provider side
/// mock.set_status("pay_mock_1", ProviderPaymentStatus::Paid);
///
/// // Inject errors
/// mock.set_method_error("fetch_status", PaymentError::unavailable("down"));
/// ```
#[derive(Default)]
pub struct MockPaymentProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Links already issued, by idempotency token.
    links: HashMap<String, PaymentLink>,

    /// Provider-side status by reference.
    statuses: HashMap<String, ProviderPaymentStatus>,

    /// Counter for generated references.
    issued: u64,

    /// Error to return on the next call to any method.
    next_error: Option<PaymentError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, PaymentError>,

    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Set what `fetch_status` reports for `reference`.
    pub fn set_status(&self, reference: &str, status: ProviderPaymentStatus) {
        self.state().statuses.insert(reference.to_string(), status);
    }

    /// Mark every issued link as paid.
    pub fn pay_all(&self) {
        let mut state = self.state();
        for status in state.statuses.values_mut() {
            *status = ProviderPaymentStatus::Paid;
        }
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: PaymentError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: PaymentError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Number of distinct links issued.
    pub fn links_issued(&self) -> usize {
        self.state().links.len()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.state().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), PaymentError> {
        let mut state = self.state();

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }
}

impl Clone for MockPaymentProvider {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_payment_link(
        &self,
        request: PaymentLinkRequest,
    ) -> Result<PaymentLink, PaymentError> {
        self.record_call(
            "create_payment_link",
            vec![
                request.session_id.to_string(),
                request.amount.to_string(),
                request.idempotency_token.to_string(),
            ],
        );
        self.check_error("create_payment_link")?;

        let mut state = self.state();
        let token = request.idempotency_token.as_str().to_string();
        if let Some(link) = state.links.get(&token) {
            return Ok(link.clone());
        }

        state.issued += 1;
        let reference = format!("pay_mock_{}", state.issued);
        let link = PaymentLink {
            url: format!("https://pay.example.test/{}", reference),
            reference: reference.clone(),
        };
        state.statuses.insert(reference, ProviderPaymentStatus::Open);
        state.links.insert(token, link.clone());
        Ok(link)
    }

    async fn fetch_status(&self, reference: &str) -> Result<ProviderPaymentStatus, PaymentError> {
        self.record_call("fetch_status", vec![reference.to_string()]);
        self.check_error("fetch_status")?;

        self.state()
            .statuses
            .get(reference)
            .copied()
            .ok_or_else(|| PaymentError::not_found(reference))
    }
}
