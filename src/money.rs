//! Fixed-point monetary amounts.
//!
//! Stored as integer cents so that repeated quantity/discount arithmetic
//! never accumulates binary floating point drift. Rounding happens exactly
//! once per derived amount (at cent precision), never mid-chain.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// A monetary amount in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Whole currency units, e.g. `from_major(500)` is 500.00.
    pub fn from_major(units: i64) -> Self {
        Money(units * 100)
    }

    /// Convert a decimal input (UI field, legacy REAL column) to cents,
    /// rounding half away from zero.
    pub fn from_decimal(value: f64) -> Self {
        Money((value * 100.0).round() as i64)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Multiply by a line quantity.
    pub fn times(self, quantity: u32) -> Money {
        Money(self.0 * i64::from(quantity))
    }

    /// `percent` of this amount, rounded to the cent. Used for discounts.
    pub fn percent(self, percent: f64) -> Money {
        Money((self.0 as f64 * percent / 100.0).round() as i64)
    }

    /// `max(0, self - other)`. The change/shortfall split never goes negative.
    pub fn sub_or_zero(self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    /// Two-decimal display, e.g. `900.00` or `-12.50`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Money::from_major(900).to_string(), "900.00");
        assert_eq!(Money::from_cents(1).to_string(), "0.01");
        assert_eq!(Money::from_cents(-1250).to_string(), "-12.50");
    }

    #[test]
    fn test_times_and_sum() {
        let lines = [Money::from_major(500).times(2), Money::from_cents(150)];
        let total: Money = lines.into_iter().sum();
        assert_eq!(total, Money::from_cents(100_150));
    }

    #[test]
    fn test_percent_rounds_to_cent() {
        // 10% of 1000.00
        assert_eq!(
            Money::from_major(1000).percent(10.0),
            Money::from_major(100)
        );
        // 12.5% of 0.99 = 0.12375 -> 0.12
        assert_eq!(Money::from_cents(99).percent(12.5), Money::from_cents(12));
        // 0.335 rounds away from zero -> 0.34
        assert_eq!(Money::from_cents(67).percent(50.0), Money::from_cents(34));
    }

    #[test]
    fn test_sub_or_zero_floors() {
        let net = Money::from_major(900);
        let tendered = Money::from_major(500);
        assert_eq!(tendered.sub_or_zero(net), Money::ZERO);
        assert_eq!(net.sub_or_zero(tendered), Money::from_major(400));
    }

    #[test]
    fn test_from_decimal() {
        assert_eq!(Money::from_decimal(12.5), Money::from_cents(1250));
        assert_eq!(Money::from_decimal(0.1), Money::from_cents(10));
        assert_eq!(Money::from_decimal(-3.333), Money::from_cents(-333));
    }
}
