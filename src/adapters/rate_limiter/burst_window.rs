//! Sliding-window burst guard.
//!
//! Counts admitted requests inside a trailing window. Independent of bucket
//! capacity: a full bucket still cannot absorb more than `threshold` requests
//! per window.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct BurstWindow {
    window: Duration,
    admitted: VecDeque<Instant>,
}

impl BurstWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            admitted: VecDeque::new(),
        }
    }

    /// Drops timestamps that fell out of the trailing window.
    pub fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.admitted.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.admitted.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn record(&mut self, now: Instant) {
        self.admitted.push_back(now);
    }

    /// Admitted requests currently held (call `prune` first).
    pub fn len(&self) -> usize {
        self.admitted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admitted.is_empty()
    }

    /// Count inside the window at `now`, without pruning.
    pub fn active_count(&self, now: Instant) -> usize {
        self.admitted
            .iter()
            .filter(|&&t| now.saturating_duration_since(t) < self.window)
            .count()
    }

    /// Time until the oldest admitted request leaves the window.
    pub fn retry_after(&self, now: Instant) -> Duration {
        self.admitted
            .front()
            .map(|&oldest| (oldest + self.window).saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prune_drops_only_expired_entries() {
        let start = Instant::now();
        let mut window = BurstWindow::new(Duration::from_secs(10));
        window.record(start);
        window.record(start + Duration::from_secs(4));
        window.record(start + Duration::from_secs(9));

        window.prune(start + Duration::from_secs(10));
        assert_eq!(window.len(), 2);

        window.prune(start + Duration::from_secs(19));
        assert!(window.is_empty());
    }

    #[test]
    fn active_count_matches_prune_without_mutating() {
        let start = Instant::now();
        let mut window = BurstWindow::new(Duration::from_secs(10));
        window.record(start);
        window.record(start + Duration::from_secs(6));

        assert_eq!(window.active_count(start + Duration::from_secs(12)), 1);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn retry_after_points_at_oldest_expiry() {
        let start = Instant::now();
        let mut window = BurstWindow::new(Duration::from_secs(10));
        window.record(start);
        window.record(start + Duration::from_secs(3));
        assert_eq!(
            window.retry_after(start + Duration::from_secs(4)),
            Duration::from_secs(6)
        );
    }
}
