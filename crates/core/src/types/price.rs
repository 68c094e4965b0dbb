//! Minor-unit price representation.
//!
//! All cart arithmetic happens in integer minor units (cents for USD) so
//! that totals are exact and comparisons are cheap. `rust_decimal` is only
//! used at the display edge, never in the math.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price in minor currency units (e.g., cents).
///
/// Serializes as a bare integer, matching the `unitPriceMinorUnits` field of
/// the remote cart service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(0);

    /// Create a price from minor units.
    #[must_use]
    pub const fn from_minor_units(minor_units: i64) -> Self {
        Self(minor_units)
    }

    /// The raw minor-unit value.
    #[must_use]
    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    /// Saturating addition; cart totals must never wrap.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction.
    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Multiply by a quantity, saturating on overflow.
    #[must_use]
    pub const fn saturating_mul(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }

    /// Format for display in dollars, e.g. `$19.99`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("${}", Decimal::new(self.0, 2))
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<i64> for Price {
    fn from(minor_units: i64) -> Self {
        Self(minor_units)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats_two_decimal_places() {
        assert_eq!(Price::from_minor_units(1999).display(), "$19.99");
        assert_eq!(Price::from_minor_units(100).display(), "$1.00");
        assert_eq!(Price::from_minor_units(5).display(), "$0.05");
        assert_eq!(Price::ZERO.display(), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Price::from_minor_units(1000);
        let b = Price::from_minor_units(250);
        assert_eq!(a.saturating_add(b), Price::from_minor_units(1250));
        assert_eq!(a.saturating_sub(b), Price::from_minor_units(750));
        assert_eq!(b.saturating_mul(3), Price::from_minor_units(750));
    }

    #[test]
    fn test_serde_transparent_integer() {
        let price = Price::from_minor_units(1999);
        assert_eq!(serde_json::to_string(&price).unwrap(), "1999");

        let back: Price = serde_json::from_str("1999").unwrap();
        assert_eq!(back, price);
    }
}
