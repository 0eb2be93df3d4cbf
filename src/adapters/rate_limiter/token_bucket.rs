//! Real-valued token bucket.
//!
//! Tokens are `f64` so fractional refill between checks is carried forward
//! instead of being rounded away. All methods take `now` explicitly; the
//! caller owns the clock.

use std::time::Duration;
use tokio::time::Instant;

use super::config::BucketLimits;

/// Absorbs float error when refill lands exactly on a whole token.
const TOKEN_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// A bucket that starts full.
    pub fn full(limits: BucketLimits, now: Instant) -> Self {
        Self {
            capacity: limits.capacity,
            tokens: limits.capacity,
            refill_rate: limits.refill_rate,
            last_refill: now,
        }
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    /// Adds `elapsed × refill_rate` tokens, capped at capacity.
    pub fn refill(&mut self, now: Instant) {
        self.tokens = self.available(now);
        if now > self.last_refill {
            self.last_refill = now;
        }
    }

    /// Token count `refill(now)` would produce, without mutating.
    pub fn available(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        (self.tokens + elapsed * self.refill_rate).min(self.capacity)
    }

    pub fn has_token(&self) -> bool {
        self.tokens + TOKEN_EPSILON >= 1.0
    }

    /// Spends one token. Call only after `has_token` returned true.
    pub fn consume(&mut self) {
        self.tokens = (self.tokens - 1.0).max(0.0);
    }

    /// Time until one whole token is available at the current level.
    pub fn time_until_token(&self) -> Duration {
        if self.has_token() || self.refill_rate <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64((1.0 - self.tokens) / self.refill_rate)
    }
}
