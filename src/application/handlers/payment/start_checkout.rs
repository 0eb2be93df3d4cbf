//! StartCheckoutHandler - Issues a payment link for the session's tab.

use std::sync::Arc;

use crate::application::TabService;
use crate::domain::foundation::{IdempotencyToken, SessionId};
use crate::domain::payment::{LedgerError, PaymentRecord, PaymentStatus};
use crate::ports::{PaymentLink, PaymentLinkRequest, PaymentProvider};

use super::CheckoutError;

/// Command to start (or resume) checkout for a session.
#[derive(Debug, Clone)]
pub struct StartCheckoutCommand {
    pub session_id: SessionId,
    pub description: Option<String>,
}

/// Result of a successful checkout start.
#[derive(Debug, Clone)]
pub struct StartCheckoutResult {
    pub link: PaymentLink,
    /// Record after the attempt was registered (status `Processing`).
    pub record: PaymentRecord,
}

/// Handler for starting checkout.
///
/// The link is requested for the tab as it stood when first read, under that
/// read's version. If the tab moves while the provider is being called, the
/// attempt is refused with `ConcurrentModification` and the caller starts over.
/// An attempt already in flight is resumed with its original token, so the
/// provider hands back the same link.
pub struct StartCheckoutHandler {
    service: Arc<TabService>,
    provider: Arc<dyn PaymentProvider>,
}

impl StartCheckoutHandler {
    pub fn new(service: Arc<TabService>, provider: Arc<dyn PaymentProvider>) -> Self {
        Self { service, provider }
    }

    pub async fn handle(
        &self,
        cmd: StartCheckoutCommand,
    ) -> Result<StartCheckoutResult, CheckoutError> {
        // 1. Read the tab under the lock
        let snapshot = self.service.snapshot_payment_state(&cmd.session_id).await?;

        let token = match snapshot.payment_status() {
            PaymentStatus::Completed => {
                return Err(LedgerError::invalid_state(PaymentStatus::Completed, "start checkout").into())
            }
            PaymentStatus::Processing => snapshot
                .idempotency_token()
                .cloned()
                .unwrap_or_else(IdempotencyToken::generate),
            PaymentStatus::Pending => {
                if snapshot.tab_total().is_zero() {
                    return Err(LedgerError::invalid_amount("nothing on the tab to pay").into());
                }
                IdempotencyToken::generate()
            }
        };

        // 2. Ask the provider, holding nothing
        let link = self
            .provider
            .create_payment_link(PaymentLinkRequest {
                session_id: cmd.session_id.clone(),
                amount: snapshot.total_due(),
                idempotency_token: token.clone(),
                description: cmd.description,
            })
            .await?;

        // 3. Register the attempt against the version the link was priced at
        let record = self
            .service
            .begin_payment(
                &cmd.session_id,
                token,
                link.reference.clone(),
                Some(snapshot.version()),
            )
            .await?;

        tracing::info!(
            session_id = %cmd.session_id,
            reference = %link.reference,
            amount = %snapshot.total_due(),
            "checkout started"
        );

        Ok(StartCheckoutResult { link, record })
    }
}
