//! Type-safe price representation.
//!
//! Prices are whole Vietnamese dong: the dong has no minor unit in practice,
//! so amounts are non-negative integers, not decimals.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Flat surcharge applied when an order is delivered rather than picked up.
pub const SHIPPING_FEE: Price = Price::new(30_000);

/// Unit price substituted when a product cannot be resolved from the catalog.
pub const FALLBACK_UNIT_PRICE: Price = Price::new(50_000);

/// Errors from price arithmetic.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceError {
    /// A sum or product exceeded the representable range.
    #[error("price arithmetic overflow")]
    Overflow,
    /// A deserialized or constructed amount was negative.
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative amount of whole VND.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct Price(u64);

impl Price {
    /// Zero dong.
    pub const ZERO: Self = Self(0);

    /// Create a price from a whole-VND amount.
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// The amount in whole VND.
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.0
    }

    /// Checked addition.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the sum is not representable.
    pub fn checked_add(self, other: Self) -> Result<Self, PriceError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(PriceError::Overflow)
    }

    /// Checked multiplication by a quantity.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` if the product is not representable.
    pub fn checked_mul(self, quantity: u32) -> Result<Self, PriceError> {
        self.0
            .checked_mul(u64::from(quantity))
            .map(Self)
            .ok_or(PriceError::Overflow)
    }
}

impl TryFrom<i64> for Price {
    type Error = PriceError;

    fn try_from(amount: i64) -> Result<Self, Self::Error> {
        u64::try_from(amount).map(Self).map_err(|_| PriceError::Negative)
    }
}

impl From<Price> for i64 {
    fn from(price: Price) -> Self {
        // Prices stay far below i64::MAX in practice; saturate rather than wrap.
        Self::try_from(price.0).unwrap_or(Self::MAX)
    }
}

impl fmt::Display for Price {
    /// Renders with dot-grouped thousands and the dong sign: `123.000 ₫`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        write!(f, "{grouped} ₫")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_grouping() {
        assert_eq!(Price::new(0).to_string(), "0 ₫");
        assert_eq!(Price::new(500).to_string(), "500 ₫");
        assert_eq!(Price::new(25_000).to_string(), "25.000 ₫");
        assert_eq!(Price::new(1_234_567).to_string(), "1.234.567 ₫");
    }

    #[test]
    fn test_checked_math() {
        let subtotal = Price::new(10_000).checked_mul(2).unwrap();
        assert_eq!(subtotal, Price::new(20_000));

        let total = subtotal.checked_add(SHIPPING_FEE).unwrap();
        assert_eq!(total, Price::new(50_000));

        assert_eq!(
            Price::new(u64::MAX).checked_add(Price::new(1)),
            Err(PriceError::Overflow)
        );
    }

    #[test]
    fn test_serde_rejects_negative() {
        let parsed: Result<Price, _> = serde_json::from_str("-1");
        assert!(parsed.is_err());

        let parsed: Price = serde_json::from_str("25000").unwrap();
        assert_eq!(parsed, Price::new(25_000));
    }

    #[test]
    fn test_serde_roundtrip() {
        let json = serde_json::to_string(&Price::new(30_000)).unwrap();
        assert_eq!(json, "30000");
    }
}
