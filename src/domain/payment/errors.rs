//! Ledger error types.
//!
//! Every foreground operation returns these as values. One session's failure
//! never affects another.
//!
//! | Error | Code | Caller action |
//! |-------|------|---------------|
//! | InsufficientFunds | INSUFFICIENT_FUNDS | surface balance to the user |
//! | ConcurrentModification | CONCURRENT_MODIFICATION | re-read and retry |
//! | RateLimited | RATE_LIMITED | back off |
//! | SessionLimitExceeded | SESSION_LIMIT_EXCEEDED | refuse the new session |
//! | InvalidTipPercentage | INVALID_TIP_PERCENTAGE | ask for 10, 15 or 20 |
//! | InvalidAmount | INVALID_AMOUNT | reject the request |
//! | InvalidState | INVALID_STATE_TRANSITION | re-read payment status |
//! | Validation | VALIDATION_FAILED | fix the input |

use std::time::Duration;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, Money, ValidationError};

use super::PaymentStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Money, requested: Money },

    #[error("record changed concurrently: expected version {expected}, found {actual}")]
    ConcurrentModification {
        expected: u64,
        actual: u64,
        balance: Money,
    },

    #[error("rate limited: {reason}")]
    RateLimited {
        reason: String,
        retry_after: Option<Duration>,
    },

    #[error("session limit of {limit} concurrent sessions reached")]
    SessionLimitExceeded { limit: usize },

    #[error("tip percentage {0} is not one of 10, 15, 20")]
    InvalidTipPercentage(u32),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("cannot {attempted} while payment is {current}")]
    InvalidState {
        current: PaymentStatus,
        attempted: &'static str,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl LedgerError {
    pub fn invalid_amount(reason: impl Into<String>) -> Self {
        LedgerError::InvalidAmount(reason.into())
    }

    pub fn invalid_state(current: PaymentStatus, attempted: &'static str) -> Self {
        LedgerError::InvalidState { current, attempted }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            LedgerError::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
            LedgerError::ConcurrentModification { .. } => ErrorCode::ConcurrentModification,
            LedgerError::RateLimited { .. } => ErrorCode::RateLimited,
            LedgerError::SessionLimitExceeded { .. } => ErrorCode::SessionLimitExceeded,
            LedgerError::InvalidTipPercentage(_) => ErrorCode::InvalidTipPercentage,
            LedgerError::InvalidAmount(_) => ErrorCode::InvalidAmount,
            LedgerError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            LedgerError::Validation(_) => ErrorCode::ValidationFailed,
        }
    }

    /// Balance observed when the operation was rejected, if the error carries one.
    pub fn balance(&self) -> Option<Money> {
        match self {
            LedgerError::InsufficientFunds { balance, .. }
            | LedgerError::ConcurrentModification { balance, .. } => Some(*balance),
            _ => None,
        }
    }

    /// True when re-reading and retrying may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::ConcurrentModification { .. } | LedgerError::RateLimited { .. }
        )
    }
}

impl From<LedgerError> for DomainError {
    fn from(err: LedgerError) -> Self {
        let code = err.code();
        let domain = DomainError::new(code, err.to_string());
        match err.balance() {
            Some(balance) => domain.with_detail("balance", balance.to_string()),
            None => domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_variants() {
        let err = LedgerError::InsufficientFunds {
            balance: Money::from_cents(98750),
            requested: Money::from_cents(200000),
        };
        assert_eq!(err.code(), ErrorCode::InsufficientFunds);
        assert_eq!(err.balance(), Some(Money::from_cents(98750)));
        assert_eq!(
            LedgerError::InvalidTipPercentage(5).code(),
            ErrorCode::InvalidTipPercentage
        );
    }

    #[test]
    fn only_conflicts_and_rate_limits_are_retryable() {
        let conflict = LedgerError::ConcurrentModification {
            expected: 1,
            actual: 2,
            balance: Money::ZERO,
        };
        assert!(conflict.is_retryable());
        assert!(!LedgerError::SessionLimitExceeded { limit: 3 }.is_retryable());
    }

    #[test]
    fn converts_to_domain_error_with_balance_detail() {
        let err: DomainError = LedgerError::InsufficientFunds {
            balance: Money::from_cents(500),
            requested: Money::from_cents(900),
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientFunds);
        assert_eq!(err.details.get("balance"), Some(&"5.00".to_string()));
    }
}
