//! Monetary amounts with currency information.
//!
//! Shopify transmits amounts as decimal strings; this type keeps them as
//! [`Decimal`] so arithmetic (line totals, cart subtotals) never goes through
//! floating point.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Money`] amount.
#[derive(thiserror::Error, Debug, Clone)]
pub enum MoneyError {
    /// The amount string is not a valid decimal number.
    #[error("invalid money amount {amount:?}: {reason}")]
    InvalidAmount {
        /// The offending input.
        amount: String,
        /// Parser error detail.
        reason: String,
    },
}

/// A monetary amount with its ISO 4217 currency code.
///
/// The amount serializes as a string (e.g., `"19.99"`), matching the wire
/// format of the Storefront API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code (e.g., "USD", "EUR").
    pub currency_code: String,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: String) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Zero in the given currency.
    #[must_use]
    pub fn zero(currency_code: &str) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency_code: currency_code.to_owned(),
        }
    }

    /// Parse an upstream decimal string (e.g., `"19.99"`) into a `Money`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::InvalidAmount`] if the string is not a valid
    /// decimal number.
    pub fn parse(amount: &str, currency_code: &str) -> Result<Self, MoneyError> {
        let amount = Decimal::from_str(amount).map_err(|e| MoneyError::InvalidAmount {
            amount: amount.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            amount,
            currency_code: currency_code.to_owned(),
        })
    }

    /// The amount multiplied by a line quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        self.amount * Decimal::from(quantity)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency_code)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let money = Money::parse("19.99", "USD").unwrap();
        assert_eq!(money.amount, Decimal::new(1999, 2));
        assert_eq!(money.currency_code, "USD");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            Money::parse("not-a-number", "USD"),
            Err(MoneyError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_times_keeps_scale() {
        let money = Money::parse("10.00", "USD").unwrap();
        assert_eq!(money.times(2).to_string(), "20.00");
    }

    #[test]
    fn test_display() {
        let money = Money::parse("5.50", "EUR").unwrap();
        assert_eq!(money.to_string(), "5.50 EUR");
    }

    #[test]
    fn test_serde_amount_as_string() {
        let money = Money::parse("19.99", "USD").unwrap();
        let json = serde_json::to_value(&money).unwrap();
        assert_eq!(json["amount"], "19.99");
        assert_eq!(json["currency_code"], "USD");
    }
}
