//! TabService - Entry point for callers that address sessions by id.
//!
//! Each method takes the session lock, runs one ledger operation and releases
//! the lock before returning. Callers that need several operations in one hold
//! use `session_lock` with the `PaymentLedger` directly, or `with_session`.
//!
//! Admission is a separate step. The by-id operations below (`charge`,
//! `set_tip`, `place_order`, ...) do not consult the admission gate and never
//! spend a token. Request-facing callers must either call `check_admission`
//! first or go through `with_session`, which admits before locking. The
//! ungated methods are for trusted internal callers such as the checkout
//! handlers, which run after the request was already admitted.

use std::sync::Arc;

use crate::adapters::rate_limiter::AdmissionController;
use crate::adapters::session::{
    SessionGuard, SessionLockTable, SessionStateRegistry, SessionSweeper, SweeperConfig,
};
use crate::config::AppConfig;
use crate::domain::foundation::{IdempotencyToken, Money, SessionId};
use crate::domain::payment::{ChargeReceipt, LedgerError, PaymentRecord, TipSummary};
use crate::ports::{AdmissionDecision, AdmissionGate, SessionResourceCleaner};

use super::ledger::{OrderReceipt, PaymentLedger};

#[derive(Clone)]
pub struct TabService {
    locks: Arc<SessionLockTable>,
    registry: Arc<SessionStateRegistry>,
    admission: Arc<dyn AdmissionGate>,
    ledger: PaymentLedger,
}

impl TabService {
    pub fn new(
        locks: Arc<SessionLockTable>,
        registry: Arc<SessionStateRegistry>,
        admission: Arc<dyn AdmissionGate>,
    ) -> Self {
        let ledger = PaymentLedger::new(registry.clone());
        Self {
            locks,
            registry,
            admission,
            ledger,
        }
    }

    /// Wires the in-process components from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let max_sessions = config.session.max_sessions;
        Self::new(
            Arc::new(SessionLockTable::new(max_sessions)),
            Arc::new(SessionStateRegistry::new(config.ledger.starting_balance)),
            Arc::new(AdmissionController::new(config.admission.clone(), max_sessions)),
        )
    }

    /// A sweeper over this service's sessions.
    pub fn sweeper(
        &self,
        cleaner: Arc<dyn SessionResourceCleaner>,
        config: SweeperConfig,
    ) -> SessionSweeper {
        SessionSweeper::new(
            self.locks.clone(),
            self.registry.clone(),
            self.admission.clone(),
            cleaner,
            config,
        )
    }

    pub fn ledger(&self) -> &PaymentLedger {
        &self.ledger
    }

    pub fn locks(&self) -> &Arc<SessionLockTable> {
        &self.locks
    }

    pub fn registry(&self) -> &Arc<SessionStateRegistry> {
        &self.registry
    }

    pub fn admission(&self) -> &Arc<dyn AdmissionGate> {
        &self.admission
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Locking and admission
    // ════════════════════════════════════════════════════════════════════════════

    pub async fn session_lock(&self, session_id: &SessionId) -> Result<SessionGuard, LedgerError> {
        self.locks.acquire(session_id).await
    }

    pub fn release(&self, guard: SessionGuard) {
        self.locks.release(guard);
    }

    pub fn check_admission(&self, session_id: &SessionId) -> AdmissionDecision {
        self.admission.check(session_id)
    }

    /// Admits, locks, runs `op`, releases.
    ///
    /// # Errors
    ///
    /// `RateLimited` or `SessionLimitExceeded` before the lock is touched,
    /// otherwise whatever `op` returns.
    pub async fn with_session<R>(
        &self,
        session_id: &SessionId,
        op: impl FnOnce(&PaymentLedger, &SessionGuard) -> Result<R, LedgerError>,
    ) -> Result<R, LedgerError> {
        self.admission.check(session_id).into_result()?;
        let guard = self.locks.acquire(session_id).await?;
        let result = op(&self.ledger, &guard);
        self.locks.release(guard);
        result
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Ledger operations (not admission-gated)
    // ════════════════════════════════════════════════════════════════════════════

    pub async fn charge(
        &self,
        session_id: &SessionId,
        amount: Money,
        expected_version: Option<u64>,
    ) -> Result<ChargeReceipt, LedgerError> {
        let guard = self.locks.acquire(session_id).await?;
        self.ledger.charge(&guard, amount, expected_version)
    }

    pub async fn set_tip(
        &self,
        session_id: &SessionId,
        percentage: u32,
    ) -> Result<TipSummary, LedgerError> {
        let guard = self.locks.acquire(session_id).await?;
        self.ledger.set_tip(&guard, percentage)
    }

    pub async fn begin_payment(
        &self,
        session_id: &SessionId,
        token: IdempotencyToken,
        reference: impl Into<String>,
        expected_version: Option<u64>,
    ) -> Result<PaymentRecord, LedgerError> {
        let guard = self.locks.acquire(session_id).await?;
        self.ledger
            .begin_payment(&guard, token, reference, expected_version)
    }

    pub async fn complete_payment(
        &self,
        session_id: &SessionId,
        token: &IdempotencyToken,
    ) -> Result<bool, LedgerError> {
        let guard = self.locks.acquire(session_id).await?;
        Ok(self.ledger.complete_payment(&guard, token))
    }

    pub async fn mark_needs_reconciliation(
        &self,
        session_id: &SessionId,
    ) -> Result<PaymentRecord, LedgerError> {
        let guard = self.locks.acquire(session_id).await?;
        Ok(self.ledger.mark_needs_reconciliation(&guard))
    }

    pub async fn reset_payment(&self, session_id: &SessionId) -> Result<bool, LedgerError> {
        let guard = self.locks.acquire(session_id).await?;
        Ok(self.ledger.reset_payment(&guard))
    }

    /// Read-only copy of the payment record, taken under the session lock.
    pub async fn snapshot_payment_state(
        &self,
        session_id: &SessionId,
    ) -> Result<PaymentRecord, LedgerError> {
        let guard = self.locks.acquire(session_id).await?;
        Ok(self.ledger.snapshot(&guard))
    }

    pub async fn place_order(
        &self,
        session_id: &SessionId,
        item: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<OrderReceipt, LedgerError> {
        let guard = self.locks.acquire(session_id).await?;
        self.ledger.place_order(&guard, item, quantity, unit_price)
    }

    pub async fn record_turn(
        &self,
        session_id: &SessionId,
        intent: Option<String>,
    ) -> Result<u64, LedgerError> {
        let guard = self.locks.acquire(session_id).await?;
        Ok(self.ledger.record_turn(&guard, intent))
    }
}
