//! Per-session payment record and its versioned mutations.
//!
//! Every method here is pure and synchronous. The ledger calls them while
//! holding the session lock, which makes each "read, validate, mutate" step a
//! single compare-and-swap on `version`.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{IdempotencyToken, Money, StateMachine};

use super::{LedgerError, PaymentStatus, TipPercentage};

/// Balance, tab, tip and payment progress for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    balance: Money,
    tab_total: Money,
    tip: Option<TipPercentage>,
    tip_amount: Money,
    payment_reference: Option<String>,
    payment_status: PaymentStatus,
    idempotency_token: Option<IdempotencyToken>,
    version: u64,
    needs_reconciliation: bool,
}

/// Outcome of a successful charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChargeReceipt {
    pub balance: Money,
    pub tab_total: Money,
    pub version: u64,
}

/// Tip state after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TipSummary {
    pub tip: Option<TipPercentage>,
    pub tip_amount: Money,
    /// Tab plus tip.
    pub total: Money,
    pub version: u64,
}

impl PaymentRecord {
    /// Fresh record with an empty tab.
    pub fn new(starting_balance: Money) -> Self {
        Self {
            balance: starting_balance,
            tab_total: Money::ZERO,
            tip: None,
            tip_amount: Money::ZERO,
            payment_reference: None,
            payment_status: PaymentStatus::Pending,
            idempotency_token: None,
            version: 0,
            needs_reconciliation: false,
        }
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn tab_total(&self) -> Money {
        self.tab_total
    }

    pub fn tip(&self) -> Option<TipPercentage> {
        self.tip
    }

    pub fn tip_amount(&self) -> Money {
        self.tip_amount
    }

    /// Tab plus tip: what the guest owes.
    pub fn total_due(&self) -> Money {
        self.tab_total + self.tip_amount
    }

    pub fn payment_reference(&self) -> Option<&str> {
        self.payment_reference.as_deref()
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn idempotency_token(&self) -> Option<&IdempotencyToken> {
        self.idempotency_token.as_ref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn needs_reconciliation(&self) -> bool {
        self.needs_reconciliation
    }

    /// Fails with `ConcurrentModification` if `expected` is given and stale.
    pub fn check_version(&self, expected: Option<u64>) -> Result<(), LedgerError> {
        match expected {
            Some(expected) if expected != self.version => {
                Err(LedgerError::ConcurrentModification {
                    expected,
                    actual: self.version,
                    balance: self.balance,
                })
            }
            _ => Ok(()),
        }
    }

    /// Moves `amount` from balance onto the tab.
    ///
    /// Refused while an attempt is `Processing`: the provider link was priced
    /// from the current tab. Version is checked before funds; no failure
    /// mutates the record.
    pub fn charge(
        &mut self,
        amount: Money,
        expected_version: Option<u64>,
    ) -> Result<ChargeReceipt, LedgerError> {
        if amount.is_zero() || amount.is_negative() {
            return Err(LedgerError::invalid_amount(format!(
                "charge must be positive, got {}",
                amount
            )));
        }
        self.ensure_tab_open("charge")?;
        self.check_version(expected_version)?;

        let balance = self
            .balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            })?;

        let tab_total = self
            .tab_total
            .checked_add(amount)
            .ok_or_else(|| LedgerError::invalid_amount("tab total out of range"))?;

        self.balance = balance;
        self.tab_total = tab_total;
        self.recompute_tip();
        self.bump();

        Ok(ChargeReceipt {
            balance: self.balance,
            tab_total: self.tab_total,
            version: self.version,
        })
    }

    /// Selects `tip`, or clears it when it is already the stored choice.
    ///
    /// Refused while an attempt is `Processing`.
    pub fn toggle_tip(&mut self, tip: TipPercentage) -> Result<TipSummary, LedgerError> {
        self.ensure_tab_open("change tip")?;
        self.tip = if self.tip == Some(tip) { None } else { Some(tip) };
        self.recompute_tip();
        self.bump();

        Ok(TipSummary {
            tip: self.tip,
            tip_amount: self.tip_amount,
            total: self.total_due(),
            version: self.version,
        })
    }

    /// Starts a payment attempt: `Pending → Processing`.
    ///
    /// Repeating the call with the token already in flight changes nothing.
    pub fn begin_payment(
        &mut self,
        token: IdempotencyToken,
        reference: impl Into<String>,
        expected_version: Option<u64>,
    ) -> Result<(), LedgerError> {
        if self.payment_status == PaymentStatus::Processing
            && self.idempotency_token.as_ref() == Some(&token)
        {
            return Ok(());
        }
        self.check_version(expected_version)?;
        if self.tab_total.is_zero() {
            return Err(LedgerError::invalid_amount("nothing on the tab to pay"));
        }

        let next = self
            .payment_status
            .transition_to(PaymentStatus::Processing)
            .map_err(|_| LedgerError::invalid_state(self.payment_status, "begin payment"))?;

        self.payment_status = next;
        self.idempotency_token = Some(token);
        self.payment_reference = Some(reference.into());
        self.needs_reconciliation = false;
        self.bump();
        Ok(())
    }

    /// Settles the attempt identified by `token`.
    ///
    /// Returns false, without mutating, unless the record is `Processing`
    /// under that same token.
    pub fn complete_payment(&mut self, token: &IdempotencyToken) -> bool {
        if self.idempotency_token.as_ref() != Some(token) {
            return false;
        }
        let Ok(next) = self.payment_status.transition_to(PaymentStatus::Completed) else {
            return false;
        };

        self.payment_status = next;
        self.tab_total = Money::ZERO;
        self.tip = None;
        self.tip_amount = Money::ZERO;
        self.needs_reconciliation = false;
        self.bump();
        true
    }

    /// Flags that the provider's confirmation could not be verified.
    pub fn mark_needs_reconciliation(&mut self) {
        self.needs_reconciliation = true;
        self.bump();
    }

    /// Explicit external reset back to `Pending`.
    ///
    /// Clears the attempt's token, reference and reconciliation flag; the tab
    /// is left alone. Returns false when already pending.
    pub fn reset_payment(&mut self) -> bool {
        if self.payment_status == PaymentStatus::Pending {
            return false;
        }
        self.payment_status = PaymentStatus::Pending;
        self.idempotency_token = None;
        self.payment_reference = None;
        self.needs_reconciliation = false;
        self.bump();
        true
    }

    fn ensure_tab_open(&self, attempted: &'static str) -> Result<(), LedgerError> {
        if self.payment_status == PaymentStatus::Processing {
            return Err(LedgerError::invalid_state(self.payment_status, attempted));
        }
        Ok(())
    }

    fn recompute_tip(&mut self) {
        self.tip_amount = match self.tip {
            Some(tip) => self.tab_total.percent(tip.value()),
            None => Money::ZERO,
        };
    }

    fn bump(&mut self) {
        self.version += 1;
    }
}
