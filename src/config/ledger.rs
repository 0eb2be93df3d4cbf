//! Ledger configuration

use serde::Deserialize;

use crate::domain::foundation::Money;

use super::error::ValidationError;

/// Payment ledger settings
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Balance a fresh session starts with
    #[serde(default = "default_starting_balance")]
    pub starting_balance: Money,
}

impl LedgerConfig {
    /// Validate ledger configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.starting_balance.is_negative() || self.starting_balance > Money::MAX_BALANCE {
            return Err(ValidationError::InvalidStartingBalance);
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            starting_balance: default_starting_balance(),
        }
    }
}

fn default_starting_balance() -> Money {
    Money::from_cents(100_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_starting_balance_is_one_thousand() {
        let config = LedgerConfig::default();
        assert_eq!(config.starting_balance.to_string(), "1000.00");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_negative_starting_balance() {
        let config = LedgerConfig {
            starting_balance: "-1".parse().unwrap(),
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidStartingBalance));
    }

    #[test]
    fn rejects_starting_balance_above_ceiling() {
        let config = LedgerConfig {
            starting_balance: "1000000000000000.01".parse().unwrap(),
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidStartingBalance));

        let config = LedgerConfig {
            starting_balance: Money::MAX_BALANCE,
        };
        assert!(config.validate().is_ok());
    }
}
