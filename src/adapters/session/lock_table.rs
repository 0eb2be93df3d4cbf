//! Per-session mutual exclusion.
//!
//! The table itself sits behind one short-held mutex that only guards
//! membership: look up, insert, remove. Each entry owns an async mutex for its
//! session. The table mutex is always released before a session mutex is
//! awaited, and is never held across I/O.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{Mutex as SessionMutex, OwnedMutexGuard};
use tokio::time::Instant;

use crate::domain::foundation::SessionId;
use crate::domain::payment::LedgerError;

/// State behind each session mutex.
#[derive(Debug, Default)]
struct LockSlot {
    /// Set by the sweeper once the entry has left the table. A waiter that
    /// wins a retired lock must start over against a fresh entry.
    retired: bool,
}

#[derive(Debug)]
struct LockEntry {
    lock: Arc<SessionMutex<LockSlot>>,
    last_access: Instant,
}

/// Exclusive hold on one session. Dropping it releases the session.
#[must_use = "the session is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SessionGuard {
    session_id: SessionId,
    slot: OwnedMutexGuard<LockSlot>,
}

impl SessionGuard {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

/// Lazily populated map of session locks.
#[derive(Debug)]
pub struct SessionLockTable {
    entries: Mutex<HashMap<SessionId, LockEntry>>,
    max_sessions: usize,
}

impl SessionLockTable {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_sessions,
        }
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    fn table(&self) -> MutexGuard<'_, HashMap<SessionId, LockEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks up or creates the entry and stamps its last access.
    fn checkout(&self, session_id: &SessionId) -> Result<Arc<SessionMutex<LockSlot>>, LedgerError> {
        let now = Instant::now();
        let mut table = self.table();
        if let Some(entry) = table.get_mut(session_id) {
            entry.last_access = now;
            return Ok(entry.lock.clone());
        }
        if table.len() >= self.max_sessions {
            return Err(LedgerError::SessionLimitExceeded {
                limit: self.max_sessions,
            });
        }
        let lock = Arc::new(SessionMutex::new(LockSlot::default()));
        table.insert(
            session_id.clone(),
            LockEntry {
                lock: lock.clone(),
                last_access: now,
            },
        );
        tracing::debug!(session_id = %session_id, sessions = table.len(), "session lock created");
        Ok(lock)
    }

    /// Waits for exclusive access to `session_id`, creating its entry if needed.
    ///
    /// # Errors
    ///
    /// `SessionLimitExceeded` when the session is new and the table is full.
    pub async fn acquire(&self, session_id: &SessionId) -> Result<SessionGuard, LedgerError> {
        loop {
            let lock = self.checkout(session_id)?;
            let slot = lock.lock_owned().await;
            if slot.retired {
                tracing::debug!(session_id = %session_id, "session retired while waiting, retrying");
                continue;
            }
            return Ok(SessionGuard {
                session_id: session_id.clone(),
                slot,
            });
        }
    }

    /// Gives the session back.
    pub fn release(&self, guard: SessionGuard) {
        drop(guard);
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.table().contains_key(session_id)
    }

    /// Sessions not acquired for at least `threshold`.
    pub fn idle_sessions(&self, threshold: Duration) -> Vec<SessionId> {
        let now = Instant::now();
        self.table()
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.last_access) >= threshold)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Removes an idle session that nobody holds.
    ///
    /// Never waits: a held session is busy and therefore not idle. Idleness is
    /// re-checked under the table lock after the session lock is taken, since
    /// an acquirer may have stamped the entry in between. `retire` runs with
    /// both locks held, just before the entry leaves the table, so no fresh
    /// entry for the same id can exist while it runs. It must be O(1) and must
    /// not block.
    ///
    /// Returns true when the session was retired.
    pub fn try_retire<F>(&self, session_id: &SessionId, threshold: Duration, retire: F) -> bool
    where
        F: FnOnce(&SessionGuard),
    {
        let lock = match self.table().get(session_id) {
            Some(entry) => entry.lock.clone(),
            None => return false,
        };
        let Ok(slot) = lock.clone().try_lock_owned() else {
            return false;
        };
        let mut guard = SessionGuard {
            session_id: session_id.clone(),
            slot,
        };

        let now = Instant::now();
        let mut table = self.table();
        let still_idle = table.get(session_id).is_some_and(|entry| {
            Arc::ptr_eq(&entry.lock, &lock)
                && now.saturating_duration_since(entry.last_access) >= threshold
        });
        if !still_idle {
            return false;
        }

        retire(&guard);
        table.remove(session_id);
        guard.slot.retired = true;
        true
    }
}
