//! Money value object.
//!
//! Amounts are whole Colombian pesos (COP has no minor unit in practice),
//! kept as `i64` so all financial arithmetic is exact integer math.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn cop(amount: i64) -> Self {
        Self(amount)
    }

    pub fn amount(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn add(&self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    /// Subtraction floored at zero. Totals never go negative.
    pub fn saturating_sub(&self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    pub fn multiply(&self, qty: u32) -> Money {
        Money(self.0.saturating_mul(i64::from(qty)))
    }

    /// `value` percent of this amount, truncated to whole pesos.
    pub fn percent(&self, value: i64) -> Money {
        Money(self.0.saturating_mul(value) / 100)
    }

    pub fn min(&self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Money(amount)
    }
}

/// Storefront display format: `$` plus es-CO thousands grouping, e.g. `$68.900`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let negative = self.0 < 0;
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
        let offset = digits.len() % 3;
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (i + 3 - offset) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        if negative {
            write!(f, "-${grouped}")
        } else {
            write!(f, "${grouped}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Money::cop(6500);
        assert_eq!(a.multiply(5), Money::cop(32500));
        assert_eq!(a.add(Money::cop(900)), Money::cop(7400));
        assert_eq!(Money::cop(100).saturating_sub(Money::cop(250)), Money::ZERO);
    }

    #[test]
    fn test_percent_truncates() {
        assert_eq!(Money::cop(50000).percent(20), Money::cop(10000));
        assert_eq!(Money::cop(999).percent(10), Money::cop(99));
    }

    #[test]
    fn test_display_grouping() {
        assert_eq!(Money::cop(68900).to_string(), "$68.900");
        assert_eq!(Money::cop(7400).to_string(), "$7.400");
        assert_eq!(Money::cop(500).to_string(), "$500");
        assert_eq!(Money::cop(1234567).to_string(), "$1.234.567");
        assert_eq!(Money::ZERO.to_string(), "$0");
    }
}
