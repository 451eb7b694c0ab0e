//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A non-negative unit price in the store currency.
///
/// Construction clamps negative amounts to zero, so every `Price` that
/// reaches domain logic satisfies `amount() >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price, clamping negative amounts to zero.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(amount.max(Decimal::ZERO))
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self::new(Decimal::new(cents, 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Line total for `quantity` units, saturating at `Decimal::MAX`.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        self.0.saturating_mul(Decimal::from(quantity))
    }
}

/// Sum of `amounts`, saturating at `Decimal::MAX` instead of panicking.
#[must_use]
pub fn saturating_total(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Sum of `quantities`, saturating at `u32::MAX` instead of panicking.
#[must_use]
pub fn saturating_units(quantities: impl IntoIterator<Item = u32>) -> u32 {
    quantities.into_iter().fold(0, u32::saturating_add)
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_amount_clamps_to_zero() {
        assert_eq!(Price::new(Decimal::new(-500, 2)), Price::ZERO);
    }

    #[test]
    fn test_times_multiplies_quantity() {
        let price = Price::from_cents(1999);
        assert_eq!(price.times(3), Decimal::new(5997, 2));
    }

    #[test]
    fn test_huge_quantities_saturate() {
        let price = Price::new(Decimal::MAX);
        assert_eq!(price.times(u32::MAX), Decimal::MAX);
        assert_eq!(
            saturating_total([Decimal::MAX, Decimal::ONE]),
            Decimal::MAX
        );
        assert_eq!(saturating_units([4_000_000_000, 400_000_000]), u32::MAX);
        assert_eq!(saturating_units([2, 3]), 5);
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Price::from_cents(1000).to_string(), "10.00");
    }

    #[test]
    fn test_deserialize_clamps() {
        let price: Price = serde_json::from_str("\"-3.50\"").unwrap();
        assert_eq!(price, Price::ZERO);
    }
}
