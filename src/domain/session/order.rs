//! Order state - what the guest has ordered this session.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, Timestamp, ValidationError};

/// One ordered item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
    pub ordered_at: Timestamp,
}

impl OrderLine {
    /// Builds a line, rejecting blank items, zero quantities and free prices.
    pub fn new(
        item: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self, ValidationError> {
        let item = item.into();
        if item.trim().is_empty() {
            return Err(ValidationError::empty_field("item"));
        }
        if quantity == 0 {
            return Err(ValidationError::invalid_format(
                "quantity",
                "must be at least 1",
            ));
        }
        let unit_price = Money::positive(unit_price.amount())?;
        let line_total = unit_price.checked_times(quantity).ok_or_else(|| {
            ValidationError::invalid_format("unit_price", "line total is out of range")
        })?;
        Ok(Self {
            item,
            quantity,
            unit_price,
            line_total,
            ordered_at: Timestamp::now(),
        })
    }
}

/// Ordered lines for one session, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderState {
    lines: Vec<OrderLine>,
}

impl OrderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: OrderLine) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }

    /// Sum of line totals since the session started.
    pub fn ordered_total(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::ZERO, |acc, line| acc + line.line_total)
    }
}
