//! Admission control port for abuse and overload protection.
//!
//! Callers consult the gate before taking a session lock. Rejections are
//! immediate: the gate never queues.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::domain::foundation::{ErrorCode, SessionId};
use crate::domain::payment::LedgerError;

/// Port for admission decisions.
///
/// Implementations must be thread-safe, and their bucket state must be guarded
/// separately from session locks so rate-limit traffic never contends with
/// ledger mutations.
pub trait AdmissionGate: Send + Sync {
    /// Decide whether a request for `session_id` may proceed, consuming a
    /// permit when it does.
    fn check(&self, session_id: &SessionId) -> AdmissionDecision;

    /// Current quota for a tracked session without consuming anything.
    ///
    /// Returns `None` for sessions the gate has never seen (or has evicted).
    fn status(&self, session_id: &SessionId) -> Option<AdmissionStatus>;

    /// Drop all per-session admission state. Returns true if any existed.
    fn evict(&self, session_id: &SessionId) -> bool;

    /// Drop state for sessions not checked within `threshold` whose quota has
    /// fully recovered, returning their ids. Covers sessions that were
    /// admitted but never took a session lock.
    fn evict_idle(&self, threshold: Duration) -> Vec<SessionId>;

    /// Number of sessions currently holding admission state.
    fn tracked_sessions(&self) -> usize;
}

/// Result of an admission check.
#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionDecision {
    /// Request admitted; quota after consumption.
    Allowed(AdmissionStatus),
    /// Request refused.
    Denied(AdmissionDenied),
}

impl AdmissionDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionDecision::Allowed(_))
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, AdmissionDecision::Denied(_))
    }

    /// The rejection reason, if denied.
    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            AdmissionDecision::Allowed(_) => None,
            AdmissionDecision::Denied(denied) => Some(denied.reason),
        }
    }

    /// Converts a denial into the matching ledger error.
    pub fn into_result(self) -> Result<AdmissionStatus, LedgerError> {
        match self {
            AdmissionDecision::Allowed(status) => Ok(status),
            AdmissionDecision::Denied(denied) => Err(denied.into()),
        }
    }
}

/// Quota snapshot for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionStatus {
    /// Tokens left in the session bucket.
    pub session_tokens: f64,
    /// Tokens left in the global bucket.
    pub global_tokens: f64,
    /// Requests admitted inside the trailing burst window.
    pub burst_count: usize,
}

/// Details of a rejection.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionDenied {
    pub reason: DenyReason,
    /// Earliest time a retry could succeed, when known.
    pub retry_after: Option<Duration>,
    pub message: String,
}

/// Which guard refused the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Trailing-window burst threshold reached.
    Burst,
    /// Per-session bucket empty.
    SessionBucket,
    /// Shared bucket empty.
    GlobalBucket,
    /// Concurrent-session ceiling reached; the session is new.
    SessionLimit { max_sessions: usize },
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::Burst => "burst",
            DenyReason::SessionBucket => "session_bucket",
            DenyReason::GlobalBucket => "global_bucket",
            DenyReason::SessionLimit { .. } => "session_limit",
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            DenyReason::SessionLimit { .. } => ErrorCode::SessionLimitExceeded,
            _ => ErrorCode::RateLimited,
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<AdmissionDenied> for LedgerError {
    fn from(denied: AdmissionDenied) -> Self {
        match denied.reason {
            DenyReason::SessionLimit { max_sessions } => LedgerError::SessionLimitExceeded {
                limit: max_sessions,
            },
            _ => LedgerError::RateLimited {
                reason: denied.message,
                retry_after: denied.retry_after,
            },
        }
    }
}
