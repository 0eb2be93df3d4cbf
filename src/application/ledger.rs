//! PaymentLedger - Versioned mutations over a session's payment record.
//!
//! Every operation takes the caller's `SessionGuard`, runs synchronously and
//! performs no I/O, so "read, validate, mutate" is one atomic step under the
//! session lock. Callers needing several operations in one hold keep the guard
//! across calls; `TabService` wraps the common single-operation case.

use std::sync::Arc;

use serde::Serialize;

use crate::adapters::session::{SessionGuard, SessionStateRegistry};
use crate::domain::foundation::{IdempotencyToken, Money};
use crate::domain::payment::{ChargeReceipt, LedgerError, PaymentRecord, TipPercentage, TipSummary};
use crate::domain::session::OrderLine;

/// Result of placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReceipt {
    pub line: OrderLine,
    pub charge: ChargeReceipt,
}

#[derive(Debug, Clone)]
pub struct PaymentLedger {
    registry: Arc<SessionStateRegistry>,
}

impl PaymentLedger {
    pub fn new(registry: Arc<SessionStateRegistry>) -> Self {
        Self { registry }
    }

    /// Moves `amount` from balance to tab.
    ///
    /// # Errors
    ///
    /// - `ConcurrentModification` when `expected_version` is stale
    /// - `InsufficientFunds` when the balance cannot cover `amount`
    /// - `InvalidAmount` for zero or negative amounts
    /// - `InvalidState` while a payment attempt is in flight
    pub fn charge(
        &self,
        guard: &SessionGuard,
        amount: Money,
        expected_version: Option<u64>,
    ) -> Result<ChargeReceipt, LedgerError> {
        let result = self
            .registry
            .payment_mut(guard, |record| record.charge(amount, expected_version));

        match &result {
            Ok(receipt) => tracing::debug!(
                session_id = %guard.session_id(),
                amount = %amount,
                balance = %receipt.balance,
                version = receipt.version,
                "charge applied"
            ),
            Err(e) => tracing::debug!(
                session_id = %guard.session_id(),
                amount = %amount,
                code = %e.code(),
                "charge rejected"
            ),
        }
        result
    }

    /// Toggles the tip: the stored percentage clears, any other one replaces it.
    pub fn set_tip(&self, guard: &SessionGuard, percentage: u32) -> Result<TipSummary, LedgerError> {
        let tip = TipPercentage::try_from(percentage)?;
        let summary = self
            .registry
            .payment_mut(guard, |record| record.toggle_tip(tip))?;
        tracing::debug!(
            session_id = %guard.session_id(),
            tip = ?summary.tip,
            tip_amount = %summary.tip_amount,
            version = summary.version,
            "tip toggled"
        );
        Ok(summary)
    }

    /// Starts a payment attempt and returns the updated record.
    pub fn begin_payment(
        &self,
        guard: &SessionGuard,
        token: IdempotencyToken,
        reference: impl Into<String>,
        expected_version: Option<u64>,
    ) -> Result<PaymentRecord, LedgerError> {
        let reference = reference.into();
        self.registry.payment_mut(guard, |record| -> Result<PaymentRecord, LedgerError> {
            record.begin_payment(token, reference, expected_version)?;
            Ok(record.clone())
        })
    }

    /// Settles the attempt identified by `token`. False means nothing changed.
    pub fn complete_payment(&self, guard: &SessionGuard, token: &IdempotencyToken) -> bool {
        let completed = self
            .registry
            .payment_mut(guard, |record| record.complete_payment(token));
        if completed {
            tracing::info!(session_id = %guard.session_id(), "payment completed");
        } else {
            tracing::debug!(session_id = %guard.session_id(), "payment completion ignored");
        }
        completed
    }

    pub fn mark_needs_reconciliation(&self, guard: &SessionGuard) -> PaymentRecord {
        tracing::warn!(session_id = %guard.session_id(), "payment flagged for reconciliation");
        self.registry.payment_mut(guard, |record| {
            record.mark_needs_reconciliation();
            record.clone()
        })
    }

    /// Explicit external reset of a finished or stuck attempt.
    pub fn reset_payment(&self, guard: &SessionGuard) -> bool {
        self.registry
            .payment_mut(guard, |record| record.reset_payment())
    }

    pub fn snapshot(&self, guard: &SessionGuard) -> PaymentRecord {
        self.registry.payment(guard)
    }

    /// Charges the line total and records the line in one step.
    pub fn place_order(
        &self,
        guard: &SessionGuard,
        item: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<OrderReceipt, LedgerError> {
        let line = OrderLine::new(item, quantity, unit_price)?;
        let charge = self.charge(guard, line.line_total, None)?;
        self.registry
            .order_mut(guard, |order| order.push(line.clone()));
        Ok(OrderReceipt { line, charge })
    }

    /// Counts a conversation turn; returns the new turn count.
    pub fn record_turn(&self, guard: &SessionGuard, intent: Option<String>) -> u64 {
        self.registry
            .conversation_mut(guard, |conversation| conversation.record_turn(intent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::session::SessionLockTable;
    use crate::domain::foundation::{ErrorCode, SessionId};
    use crate::domain::payment::PaymentStatus;

    fn m(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn setup() -> (SessionLockTable, Arc<SessionStateRegistry>, PaymentLedger) {
        let registry = Arc::new(SessionStateRegistry::new(m("1000.00")));
        (
            SessionLockTable::new(10),
            registry.clone(),
            PaymentLedger::new(registry),
        )
    }

    fn sid() -> SessionId {
        SessionId::new("guest-1").unwrap()
    }

    #[tokio::test]
    async fn tab_scenario() {
        let (locks, _, ledger) = setup();
        let guard = locks.acquire(&sid()).await.unwrap();

        let receipt = ledger.charge(&guard, m("12.50"), None).unwrap();
        assert_eq!(receipt.balance, m("987.50"));
        assert_eq!(receipt.version, 1);

        let err = ledger.charge(&guard, m("2000.00"), None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientFunds);
        assert_eq!(err.balance(), Some(m("987.50")));
        assert_eq!(ledger.snapshot(&guard).version(), 1);

        let tip = ledger.set_tip(&guard, 15).unwrap();
        assert_eq!(tip.tip_amount, m("1.875"));
        assert_eq!(tip.total, m("14.375"));

        let cleared = ledger.set_tip(&guard, 15).unwrap();
        assert_eq!(cleared.tip_amount, Money::ZERO);
        assert_eq!(cleared.total, m("12.50"));
        assert!(ledger.snapshot(&guard).tip().is_none());
    }

    #[tokio::test]
    async fn unknown_tip_is_rejected_without_mutation() {
        let (locks, _, ledger) = setup();
        let guard = locks.acquire(&sid()).await.unwrap();

        let err = ledger.set_tip(&guard, 17).unwrap_err();

        assert_eq!(err, LedgerError::InvalidTipPercentage(17));
        assert_eq!(ledger.snapshot(&guard).version(), 0);
    }

    #[tokio::test]
    async fn payment_lifecycle() {
        let (locks, _, ledger) = setup();
        let guard = locks.acquire(&sid()).await.unwrap();
        ledger.charge(&guard, m("20"), None).unwrap();
        ledger.set_tip(&guard, 10).unwrap();

        let token = IdempotencyToken::generate();
        let record = ledger
            .begin_payment(&guard, token.clone(), "pay_1", Some(2))
            .unwrap();
        assert_eq!(record.payment_status(), PaymentStatus::Processing);
        assert_eq!(record.payment_reference(), Some("pay_1"));

        assert!(!ledger.complete_payment(&guard, &IdempotencyToken::generate()));
        assert!(ledger.complete_payment(&guard, &token));
        assert!(!ledger.complete_payment(&guard, &token));

        let done = ledger.snapshot(&guard);
        assert_eq!(done.payment_status(), PaymentStatus::Completed);
        assert_eq!(done.tab_total(), Money::ZERO);
        assert_eq!(done.tip_amount(), Money::ZERO);
        assert_eq!(done.balance(), m("980"));

        assert!(ledger.reset_payment(&guard));
        assert_eq!(ledger.snapshot(&guard).payment_status(), PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn reconciliation_flag_is_recorded() {
        let (locks, _, ledger) = setup();
        let guard = locks.acquire(&sid()).await.unwrap();

        let record = ledger.mark_needs_reconciliation(&guard);

        assert!(record.needs_reconciliation());
        assert_eq!(record.version(), 1);
    }

    #[tokio::test]
    async fn place_order_charges_and_records_line() {
        let (locks, registry, ledger) = setup();
        let guard = locks.acquire(&sid()).await.unwrap();

        let receipt = ledger.place_order(&guard, "flat white", 2, m("4.25")).unwrap();

        assert_eq!(receipt.line.line_total, m("8.50"));
        assert_eq!(receipt.charge.balance, m("991.50"));
        let order = registry.order(&guard);
        assert_eq!(order.lines().len(), 1);
        assert_eq!(order.ordered_total(), m("8.50"));
    }

    #[tokio::test]
    async fn failed_order_records_nothing() {
        let (locks, registry, ledger) = setup();
        let guard = locks.acquire(&sid()).await.unwrap();

        let err = ledger
            .place_order(&guard, "caviar", 1, m("5000"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientFunds);

        let err = ledger.place_order(&guard, " ", 1, m("1")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);

        assert!(registry.order(&guard).lines().is_empty());
        assert_eq!(ledger.snapshot(&guard).version(), 0);
    }

    #[tokio::test]
    async fn oversized_order_is_rejected_not_panicking() {
        let (locks, registry, ledger) = setup();
        let guard = locks.acquire(&sid()).await.unwrap();

        let err = ledger
            .place_order(&guard, "x", 3, m("40000000000000000000000000000"))
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert!(registry.order(&guard).lines().is_empty());
        assert_eq!(ledger.snapshot(&guard).balance(), m("1000.00"));
    }

    #[tokio::test]
    async fn tab_changes_wait_for_the_payment_attempt() {
        let (locks, _, ledger) = setup();
        let guard = locks.acquire(&sid()).await.unwrap();
        ledger.charge(&guard, m("10"), None).unwrap();
        let token = IdempotencyToken::generate();
        ledger.begin_payment(&guard, token.clone(), "pay_1", None).unwrap();

        let err = ledger.charge(&guard, m("25"), None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
        let err = ledger.set_tip(&guard, 20).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
        let err = ledger.place_order(&guard, "pint", 1, m("6")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);

        assert!(ledger.complete_payment(&guard, &token));
        let record = ledger.snapshot(&guard);
        assert_eq!(record.balance(), m("990"));
        assert_eq!(record.tab_total(), Money::ZERO);
    }

    #[tokio::test]
    async fn turns_are_counted() {
        let (locks, _, ledger) = setup();
        let guard = locks.acquire(&sid()).await.unwrap();
        assert_eq!(ledger.record_turn(&guard, None), 1);
        assert_eq!(ledger.record_turn(&guard, Some("tip".into())), 2);
    }
}
