//! ConfirmPaymentHandler - Polls the provider and settles the tab.

use std::sync::Arc;

use crate::application::TabService;
use crate::domain::foundation::SessionId;
use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::ports::{PaymentProvider, ProviderPaymentStatus};

use super::CheckoutError;

/// Command to confirm the session's in-flight payment.
#[derive(Debug, Clone)]
pub struct ConfirmPaymentCommand {
    pub session_id: SessionId,
}

/// What confirmation found.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmPaymentOutcome {
    /// Provider reported paid; the tab is settled.
    Completed(PaymentRecord),
    /// The record was already completed (another confirmation won).
    AlreadyCompleted,
    /// No attempt in flight.
    NothingToConfirm,
    /// Link still open; try again later.
    Pending,
    /// Provider reports the payment failed. The attempt stays as it is
    /// until an explicit reset.
    Failed,
    /// The provider could not vouch for the attempt; flagged for follow-up.
    NeedsReconciliation(PaymentRecord),
}

pub struct ConfirmPaymentHandler {
    service: Arc<TabService>,
    provider: Arc<dyn PaymentProvider>,
}

impl ConfirmPaymentHandler {
    pub fn new(service: Arc<TabService>, provider: Arc<dyn PaymentProvider>) -> Self {
        Self { service, provider }
    }

    pub async fn handle(
        &self,
        cmd: ConfirmPaymentCommand,
    ) -> Result<ConfirmPaymentOutcome, CheckoutError> {
        let snapshot = self.service.snapshot_payment_state(&cmd.session_id).await?;
        match snapshot.payment_status() {
            PaymentStatus::Completed => return Ok(ConfirmPaymentOutcome::AlreadyCompleted),
            PaymentStatus::Pending => return Ok(ConfirmPaymentOutcome::NothingToConfirm),
            PaymentStatus::Processing => {}
        }
        let (Some(token), Some(reference)) =
            (snapshot.idempotency_token().cloned(), snapshot.payment_reference())
        else {
            return Ok(ConfirmPaymentOutcome::NothingToConfirm);
        };

        // Provider call with no lock held
        let status = self.provider.fetch_status(reference).await;

        let guard = self.service.session_lock(&cmd.session_id).await?;
        let ledger = self.service.ledger();
        let outcome = match status {
            Ok(ProviderPaymentStatus::Paid) => {
                if ledger.complete_payment(&guard, &token) {
                    ConfirmPaymentOutcome::Completed(ledger.snapshot(&guard))
                } else {
                    moved_on(&ledger.snapshot(&guard))
                }
            }
            Ok(ProviderPaymentStatus::Open) => ConfirmPaymentOutcome::Pending,
            Ok(ProviderPaymentStatus::Failed) => {
                tracing::info!(session_id = %cmd.session_id, reference, "provider reports payment failed");
                ConfirmPaymentOutcome::Failed
            }
            Err(e) => {
                let current = ledger.snapshot(&guard);
                let same_attempt = current.payment_status() == PaymentStatus::Processing
                    && current.idempotency_token() == Some(&token);
                if !same_attempt {
                    moved_on(&current)
                } else {
                    tracing::warn!(
                        session_id = %cmd.session_id,
                        reference,
                        error = %e,
                        "payment confirmation could not be verified"
                    );
                    ConfirmPaymentOutcome::NeedsReconciliation(ledger.mark_needs_reconciliation(&guard))
                }
            }
        };
        self.service.release(guard);
        Ok(outcome)
    }
}

/// Outcome when the attempt read earlier is no longer the one in flight.
fn moved_on(current: &PaymentRecord) -> ConfirmPaymentOutcome {
    if current.payment_status() == PaymentStatus::Completed {
        ConfirmPaymentOutcome::AlreadyCompleted
    } else {
        ConfirmPaymentOutcome::NothingToConfirm
    }
}
