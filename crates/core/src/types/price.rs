//! Decimal price in Indian rupees.
//!
//! The catalog stores prices as free-form text or numbers depending on who
//! wrote the row, so deserialization accepts both and normalizes to
//! [`Decimal`].

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The text is not a decimal number.
    #[error("invalid price: {0:?}")]
    Invalid(String),
    /// Prices cannot be negative.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
}

/// A non-negative amount in rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Currency symbol used when displaying prices.
    pub const SYMBOL: &'static str = "₹";

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Parse a price from text such as `"1299"`, `"1299.50"` or `"₹1,299"`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Invalid` if the text is not a number.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let cleaned: String = s
            .trim()
            .trim_start_matches(Self::SYMBOL)
            .chars()
            .filter(|c| *c != ',')
            .collect();
        let amount =
            Decimal::from_str(cleaned.trim()).map_err(|_| PriceError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for display, e.g. `₹1299.00`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", Self::SYMBOL, self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
            Float(f64),
        }

        let price = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self::parse(&s),
            Raw::Int(n) => Self::new(Decimal::from(n)),
            Raw::Float(f) => Decimal::try_from(f)
                .map_err(|_| PriceError::Invalid(f.to_string()))
                .and_then(Self::new),
        };
        price.map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_formatted() {
        assert_eq!(Price::parse("1299").unwrap().amount(), Decimal::new(1299, 0));
        assert_eq!(
            Price::parse("₹1,299.50").unwrap().amount(),
            Decimal::new(129_950, 2)
        );
    }

    #[test]
    fn test_parse_rejects_garbage_and_negative() {
        assert!(matches!(Price::parse("free"), Err(PriceError::Invalid(_))));
        assert!(matches!(Price::parse("-5"), Err(PriceError::Negative(_))));
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::parse("49.9").unwrap().to_string(), "₹49.90");
    }

    #[test]
    fn test_deserialize_text_or_number() {
        let from_text: Price = serde_json::from_str(r#""799""#).unwrap();
        let from_int: Price = serde_json::from_str("799").unwrap();
        let from_float: Price = serde_json::from_str("799.0").unwrap();
        assert_eq!(from_text, from_int);
        assert_eq!(from_int.amount(), from_float.amount().normalize());
    }
}
