//! Tip percentage selection.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::LedgerError;

/// The tip percentages a guest can pick.
///
/// A record holds `Option<TipPercentage>`: `None` means no tip. Selecting the
/// value already stored clears it (see `PaymentRecord::toggle_tip`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum TipPercentage {
    Ten,
    Fifteen,
    Twenty,
}

impl TipPercentage {
    pub const ALL: [TipPercentage; 3] = [
        TipPercentage::Ten,
        TipPercentage::Fifteen,
        TipPercentage::Twenty,
    ];

    /// Numeric percentage (10, 15 or 20).
    pub fn value(&self) -> u32 {
        match self {
            TipPercentage::Ten => 10,
            TipPercentage::Fifteen => 15,
            TipPercentage::Twenty => 20,
        }
    }
}

impl TryFrom<u32> for TipPercentage {
    type Error = LedgerError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            10 => Ok(TipPercentage::Ten),
            15 => Ok(TipPercentage::Fifteen),
            20 => Ok(TipPercentage::Twenty),
            other => Err(LedgerError::InvalidTipPercentage(other)),
        }
    }
}

impl From<TipPercentage> for u32 {
    fn from(tip: TipPercentage) -> u32 {
        tip.value()
    }
}

impl fmt::Display for TipPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.value())
    }
}
