//! SessionSweeper - Background reclamation of idle sessions.
//!
//! Each pass:
//! 1. snapshots ids whose last access is older than `idle_expiry`
//! 2. retires each one whose lock is free, dropping its records and
//!    admission state while the lock is held
//! 3. evicts admission state idle for `idle_expiry` that no lock entry
//!    covered (sessions admitted but never locked)
//! 4. with every lock released, asks the cleaner to close downstream clients
//!    of the retired sessions
//!
//! Busy sessions are skipped and looked at again next pass. A removed
//! session is never re-inserted; its next request starts from fresh state.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `idle_expiry` | 30m | Inactivity before a session is retired |
//! | `sweep_interval` | 60s | Time between passes |
//! | `cleanup_retries` | 1 | Extra attempts for transient cleanup failures |
//!
//! ## Graceful Shutdown
//!
//! `SweeperHandle::shutdown` signals the loop and waits for it to exit. A
//! pass already under way runs to completion first.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::SessionConfig;
use crate::domain::foundation::SessionId;
use crate::ports::{AdmissionGate, CleanupError, SessionResourceCleaner};

use super::lock_table::SessionLockTable;
use super::registry::SessionStateRegistry;

/// Configuration for the sweeper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweeperConfig {
    pub idle_expiry: Duration,
    pub sweep_interval: Duration,
    pub cleanup_retries: u32,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for SweeperConfig {
    fn from(config: &SessionConfig) -> Self {
        Self {
            idle_expiry: config.idle_expiry(),
            sweep_interval: config.sweep_interval(),
            cleanup_retries: config.cleanup_retries,
        }
    }
}

/// What one pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Sessions removed this pass.
    pub expired: Vec<SessionId>,
    /// Idle candidates left alone because they were held or touched.
    pub skipped: usize,
    /// Sessions whose external cleanup ultimately failed.
    pub cleanup_failures: usize,
    /// Admission-only sessions reclaimed this pass.
    pub admission_evicted: usize,
}

pub struct SessionSweeper {
    locks: Arc<SessionLockTable>,
    registry: Arc<SessionStateRegistry>,
    admission: Arc<dyn AdmissionGate>,
    cleaner: Arc<dyn SessionResourceCleaner>,
    config: SweeperConfig,
}

impl SessionSweeper {
    pub fn new(
        locks: Arc<SessionLockTable>,
        registry: Arc<SessionStateRegistry>,
        admission: Arc<dyn AdmissionGate>,
        cleaner: Arc<dyn SessionResourceCleaner>,
        config: SweeperConfig,
    ) -> Self {
        Self {
            locks,
            registry,
            admission,
            cleaner,
            config,
        }
    }

    pub fn config(&self) -> &SweeperConfig {
        &self.config
    }

    /// Run passes on the configured interval until `shutdown` turns true
    /// or its sender goes away.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.sweep_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("session sweeper stopping");
                        return;
                    }
                }

                _ = interval.tick() => {
                    self.sweep_once().await;
                }
            }
        }
    }

    /// One full pass.
    pub async fn sweep_once(&self) -> SweepReport {
        let candidates = self.locks.idle_sessions(self.config.idle_expiry);
        let mut report = SweepReport::default();

        for session_id in candidates {
            let retired = self
                .locks
                .try_retire(&session_id, self.config.idle_expiry, |guard| {
                    self.registry.remove(guard);
                    self.admission.evict(guard.session_id());
                });
            if retired {
                report.expired.push(session_id);
            } else {
                report.skipped += 1;
            }
        }

        report.admission_evicted = self.admission.evict_idle(self.config.idle_expiry).len();

        // No lock of any kind is held past this point.
        let outcomes = join_all(report.expired.iter().map(|id| self.release_resources(id))).await;
        report.cleanup_failures = outcomes.into_iter().filter(|ok| !ok).count();

        if !report.expired.is_empty() || report.skipped > 0 || report.admission_evicted > 0 {
            tracing::info!(
                expired = report.expired.len(),
                skipped = report.skipped,
                cleanup_failures = report.cleanup_failures,
                admission_evicted = report.admission_evicted,
                remaining = self.locks.len(),
                "sweep complete"
            );
        }
        report
    }

    async fn release_resources(&self, session_id: &SessionId) -> bool {
        let mut attempt = 0;
        loop {
            match self.cleaner.release_session(session_id).await {
                Ok(()) => return true,
                Err(e @ CleanupError::Transient(_)) if attempt < self.config.cleanup_retries => {
                    attempt += 1;
                    tracing::debug!(session_id = %session_id, attempt, error = %e, "retrying session cleanup");
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        code = %e.code(),
                        error = %e,
                        "session cleanup failed"
                    );
                    return false;
                }
            }
        }
    }
}

/// Handle to a running sweeper task.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SweeperHandle {
    /// Spawn `sweeper` onto the current runtime.
    pub fn start(sweeper: Arc<SessionSweeper>) -> Self {
        let (shutdown, receiver) = watch::channel(false);
        tracing::info!(
            interval_secs = sweeper.config.sweep_interval.as_secs(),
            idle_expiry_secs = sweeper.config.idle_expiry.as_secs(),
            "session sweeper started"
        );
        let task = tokio::spawn(async move { sweeper.run(receiver).await });
        Self {
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }

    /// Stop the sweeper and wait for it to finish. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        let Some(task) = self.task.lock().await.take() else {
            return;
        };
        if let Err(e) = task.await {
            tracing::error!(error = %e, "session sweeper task failed");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}
