//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    89.99 * 2 + 120.00 = 299.97999999999996  ❌ WRONG!                   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    8999 * 2 + 12000 = 29998 cents = 299.98  ✅                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ventas_core::money::Money;
//!
//! let price = Money::from_cents(8999); // 89.99
//! let subtotal = price.multiply_quantity(2).unwrap();
//! assert_eq!(subtotal.cents(), 17998);
//! assert_eq!(subtotal.to_string(), "179.98");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Differences and refunds can be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support, serialized as plain cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use ventas_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(120, 0).cents(), 12000);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is strictly greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies money by a quantity. `None` on overflow.
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Wireless Mouse 89.99
    /// Quantity: 2
    ///      │
    ///      ▼
    /// multiply_quantity(2) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line subtotal: 179.98
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts. `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Divides evenly across `count` parts, rounding half away from zero.
    ///
    /// Returns zero when `count` is zero, which is what an empty average
    /// should report.
    ///
    /// ## Example
    /// ```rust
    /// use ventas_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1000).average_over(3).cents(), 333);
    /// assert_eq!(Money::from_cents(1001).average_over(2).cents(), 501);
    /// assert_eq!(Money::from_cents(1000).average_over(0).cents(), 0);
    /// ```
    pub fn average_over(&self, count: u64) -> Money {
        if count == 0 {
            return Money::zero();
        }
        let count = count as i128;
        let total = self.0 as i128;
        let half = count / 2;
        let rounded = if total >= 0 {
            (total + half) / count
        } else {
            (total - half) / count
        };
        Money(rounded as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as a plain decimal, e.g. `299.98`.
///
/// ## Note
/// Currency symbols and localisation are the client's concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(8999);
        assert_eq!(money.cents(), 8999);
        assert_eq!(money.major(), 89);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(29998).to_string(), "299.98");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
    }

    #[test]
    fn test_sum_of_line_subtotals() {
        let lines = [
            Money::from_cents(8999).multiply_quantity(2).unwrap(),
            Money::from_cents(12000).multiply_quantity(1).unwrap(),
        ];
        let total: Money = lines.iter().copied().sum();
        assert_eq!(total.cents(), 29998);
    }

    #[test]
    fn test_checked_arithmetic_overflow() {
        let huge = Money::from_cents(i64::MAX / 2);
        assert_eq!(huge.multiply_quantity(2).map(|m| m.cents()), Some(i64::MAX - 1));
        assert!(huge.multiply_quantity(3).is_none());
        assert!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)).is_none());
        assert_eq!(
            Money::from_cents(1).checked_add(Money::from_cents(2)),
            Some(Money::from_cents(3))
        );
    }

    #[test]
    fn test_average_rounding() {
        assert_eq!(Money::from_cents(29998).average_over(2).cents(), 14999);
        assert_eq!(Money::from_cents(5).average_over(2).cents(), 3);
        assert_eq!(Money::from_cents(-5).average_over(2).cents(), -3);
        assert!(Money::from_cents(777).average_over(0).is_zero());
    }

    #[test]
    fn test_serializes_as_cents() {
        let json = serde_json::to_string(&Money::from_cents(12000)).unwrap();
        assert_eq!(json, "12000");
    }
}
