//! Money value object.
//!
//! Amounts are exact decimals. Tips produce sub-cent values (15% of 12.50 is
//! 1.875), so nothing is rounded inside the core.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use super::ValidationError;

/// Exact monetary amount in the session's single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest balance a session may start with. Keeps tab, tip and order
    /// totals (all bounded by the starting balance) far from `Decimal` limits.
    pub const MAX_BALANCE: Self = Self(Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0)); // 10^15

    /// Wraps a decimal amount.
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Builds an amount from an integer count of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Creates an amount that must be strictly positive (charges, prices).
    pub fn positive(amount: Decimal) -> Result<Self, ValidationError> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::invalid_format(
                "amount",
                format!("must be greater than zero, got {}", amount),
            ));
        }
        Ok(Self(amount))
    }

    /// Returns the inner decimal.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Multiplies by `numerator / 100`.
    pub fn percent(&self, numerator: u32) -> Self {
        Self(self.0 * Decimal::from(numerator) / Decimal::ONE_HUNDRED)
    }

    /// Multiplies by an item count. `None` when the product is out of range.
    pub fn checked_times(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// Addition that reports overflow instead of panicking.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Subtraction that refuses to go below zero.
    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        let result = self.0.checked_sub(other.0)?;
        if result.is_sign_negative() && !result.is_zero() {
            None
        } else {
            Some(Self(result))
        }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Self)
            .map_err(|e| ValidationError::invalid_format("amount", e.to_string()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let normalized = self.0.normalize();
        if normalized.scale() <= 2 {
            write!(f, "{:.2}", normalized)
        } else {
            write!(f, "{}", normalized)
        }
    }
}
