//! In-process admission controller.
//!
//! Per-session state (bucket + burst window) lives in a sharded map; the
//! shared bucket sits behind its own mutex. Neither is held while waiting on a
//! session lock. When both are needed the shard is taken first, then the
//! global mutex.

use dashmap::DashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::domain::foundation::SessionId;
use crate::ports::{AdmissionDecision, AdmissionDenied, AdmissionGate, AdmissionStatus, DenyReason};

use super::burst_window::BurstWindow;
use super::config::AdmissionConfig;
use super::token_bucket::TokenBucket;

/// Token-bucket admission with a per-session burst guard.
///
/// Evaluation order for `check`:
/// 1. refuse a new session once `max_sessions` sessions are tracked
/// 2. burst guard (records nothing on rejection)
/// 3. refill session and global buckets
/// 4. refuse if either bucket is below one token, consuming from neither
/// 5. consume one token from both and record the admission
#[derive(Debug)]
pub struct AdmissionController {
    config: AdmissionConfig,
    max_sessions: usize,
    global: Mutex<TokenBucket>,
    sessions: DashMap<SessionId, SessionAdmission>,
    /// Serializes session creation so the ceiling is exact.
    membership: Mutex<()>,
}

#[derive(Debug)]
struct SessionAdmission {
    bucket: TokenBucket,
    burst: BurstWindow,
    /// Last `check`, admitted or not.
    last_seen: Instant,
}

impl SessionAdmission {
    /// Idle past `threshold` with nothing left to remember: a fresh entry
    /// would behave identically.
    fn is_reclaimable(&self, now: Instant, threshold: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) >= threshold
            && self.bucket.available(now) >= self.bucket.capacity()
            && self.burst.active_count(now) == 0
    }
}

impl AdmissionController {
    pub fn new(config: AdmissionConfig, max_sessions: usize) -> Self {
        let global = TokenBucket::full(config.global_bucket(), Instant::now());
        Self {
            config,
            max_sessions,
            global: Mutex::new(global),
            sessions: DashMap::new(),
            membership: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Creates admission state for an unseen session, honouring the ceiling.
    fn register(&self, session_id: &SessionId, now: Instant) -> Result<(), AdmissionDenied> {
        let _membership = self.membership.lock().unwrap_or_else(PoisonError::into_inner);
        if self.sessions.contains_key(session_id) {
            return Ok(());
        }
        if self.sessions.len() >= self.max_sessions {
            return Err(AdmissionDenied {
                reason: DenyReason::SessionLimit {
                    max_sessions: self.max_sessions,
                },
                retry_after: None,
                message: format!(
                    "concurrent session ceiling of {} reached",
                    self.max_sessions
                ),
            });
        }
        self.sessions.insert(
            session_id.clone(),
            SessionAdmission {
                bucket: TokenBucket::full(self.config.session_bucket(), now),
                burst: BurstWindow::new(self.config.burst_window()),
                last_seen: now,
            },
        );
        Ok(())
    }

    fn evaluate(&self, state: &mut SessionAdmission, now: Instant) -> AdmissionDecision {
        state.last_seen = now;
        state.burst.prune(now);
        if state.burst.len() >= self.config.burst_threshold {
            return AdmissionDecision::Denied(AdmissionDenied {
                reason: DenyReason::Burst,
                retry_after: Some(state.burst.retry_after(now)),
                message: format!(
                    "more than {} requests in {}s",
                    self.config.burst_threshold, self.config.burst_window_secs
                ),
            });
        }

        state.bucket.refill(now);
        let mut global = self.global.lock().unwrap_or_else(PoisonError::into_inner);
        global.refill(now);

        if !state.bucket.has_token() {
            return AdmissionDecision::Denied(AdmissionDenied {
                reason: DenyReason::SessionBucket,
                retry_after: Some(state.bucket.time_until_token()),
                message: "session request rate exceeded".to_string(),
            });
        }
        if !global.has_token() {
            return AdmissionDecision::Denied(AdmissionDenied {
                reason: DenyReason::GlobalBucket,
                retry_after: Some(global.time_until_token()),
                message: "service request rate exceeded".to_string(),
            });
        }

        state.bucket.consume();
        global.consume();
        state.burst.record(now);

        AdmissionDecision::Allowed(AdmissionStatus {
            session_tokens: state.bucket.tokens(),
            global_tokens: global.tokens(),
            burst_count: state.burst.len(),
        })
    }
}

impl AdmissionGate for AdmissionController {
    fn check(&self, session_id: &SessionId) -> AdmissionDecision {
        let now = Instant::now();
        loop {
            if let Some(mut state) = self.sessions.get_mut(session_id) {
                let decision = self.evaluate(&mut state, now);
                if let AdmissionDecision::Denied(denied) = &decision {
                    tracing::debug!(
                        session_id = %session_id,
                        reason = %denied.reason,
                        "admission denied"
                    );
                }
                return decision;
            }
            // Not tracked (or evicted between register and lookup): register and retry.
            if let Err(denied) = self.register(session_id, now) {
                tracing::warn!(
                    session_id = %session_id,
                    max_sessions = self.max_sessions,
                    "session refused: concurrent session ceiling reached"
                );
                return AdmissionDecision::Denied(denied);
            }
        }
    }

    fn status(&self, session_id: &SessionId) -> Option<AdmissionStatus> {
        let now = Instant::now();
        let state = self.sessions.get(session_id)?;
        let global = self.global.lock().unwrap_or_else(PoisonError::into_inner);
        Some(AdmissionStatus {
            session_tokens: state.bucket.available(now),
            global_tokens: global.available(now),
            burst_count: state.burst.active_count(now),
        })
    }

    fn evict(&self, session_id: &SessionId) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    fn evict_idle(&self, threshold: Duration) -> Vec<SessionId> {
        let now = Instant::now();
        let mut evicted = Vec::new();
        self.sessions.retain(|session_id, state| {
            if state.is_reclaimable(now, threshold) {
                evicted.push(session_id.clone());
                false
            } else {
                true
            }
        });
        if !evicted.is_empty() {
            tracing::debug!(count = evicted.len(), "idle admission state evicted");
        }
        evicted
    }

    fn tracked_sessions(&self) -> usize {
        self.sessions.len()
    }
}
