//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WHOLE-UNIT CURRENCY                                                    │
//! │                                                                         │
//! │  The shops we serve price in CFA francs ("F"), which have no           │
//! │  fractional subunit in practice. A price of 2 500 F is stored as       │
//! │  the integer 2500.                                                      │
//! │                                                                         │
//! │  Every sum, tax and change computation is integer arithmetic:          │
//! │    2500 × 3 = 7500        (never 7499.999…)                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use peelo_core::money::Money;
//!
//! let price = Money::from_units(2500);
//! let line_total = price * 2;
//! assert_eq!(line_total.units(), 5000);
//! assert_eq!(line_total.to_string(), "5 000 F");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole currency units.
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate results such as `due - allocated` may go
///   negative before being clamped
/// - **Single field tuple struct**: serializes as a bare JSON number, which
///   is exactly what the commerce API sends and expects
///
/// ## Where Money Flows
/// ```text
/// Product.price ──► CartLine.unit_price ──► line total ──► Cart subtotal
///                                                              │
///                        TaxRate ──► tax ──► total due ◄───────┘
///                                               │
///                 PaymentAllocation ──► allocated ──► remaining / change
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole currency units.
    ///
    /// ```rust
    /// use peelo_core::money::Money;
    ///
    /// assert_eq!(Money::from_units(2500).units(), 2500);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in whole currency units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    ///
    /// Used for every "remaining" and "change" figure, which are never
    /// displayed as negative numbers.
    ///
    /// ```rust
    /// use peelo_core::money::Money;
    ///
    /// assert_eq!(Money::from_units(-300).non_negative(), Money::zero());
    /// assert_eq!(Money::from_units(300).non_negative().units(), 300);
    /// ```
    #[inline]
    pub const fn non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Addition that pins at `i64::MAX` instead of overflowing.
    #[inline]
    pub const fn saturating_add(self, other: Money) -> Self {
        Money(self.0.saturating_add(other.0))
    }

    /// Subtraction that pins at `i64::MIN` instead of overflowing.
    #[inline]
    pub const fn saturating_sub(self, other: Money) -> Self {
        Money(self.0.saturating_sub(other.0))
    }

    /// Calculates tax with round-half-up integer math.
    ///
    /// ## Implementation
    /// `(amount * bps + 5000) / 10000`, computed in i128 so large carts
    /// cannot overflow.
    ///
    /// ```rust
    /// use peelo_core::money::Money;
    /// use peelo_core::types::TaxRate;
    ///
    /// // 18% VAT on 2 500 F
    /// let tax = Money::from_units(2500).calculate_tax(TaxRate::from_bps(1800));
    /// assert_eq!(tax.units(), 450);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax = (i128::from(self.0) * i128::from(rate.bps()) + 5000) / 10000;
        Money(i64::try_from(tax).unwrap_or(i64::MAX))
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use peelo_core::money::Money;
    ///
    /// assert_eq!(Money::from_units(1250).multiply_quantity(3).units(), 3750);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money grouped by thousands with the franc suffix, e.g. `12 500 F`.
///
/// ## Note
/// The register shell uses [`format_grouped`] with the configured currency
/// symbol; this impl is the default rendering.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} F", format_grouped(self.0))
    }
}

/// Formats an integer with a space between each group of three digits.
///
/// ```rust
/// use peelo_core::money::format_grouped;
///
/// assert_eq!(format_grouped(1234567), "1 234 567");
/// assert_eq!(format_grouped(-2500), "-2 500");
/// assert_eq!(format_grouped(0), "0");
/// ```
pub fn format_grouped(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    if value < 0 {
        grouped.push('-');
    }

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    grouped
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

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a line quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc.saturating_add(m))
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_units() {
        let money = Money::from_units(2500);
        assert_eq!(money.units(), 2500);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_units(2500).to_string(), "2 500 F");
        assert_eq!(Money::from_units(500).to_string(), "500 F");
        assert_eq!(Money::from_units(1_000_000).to_string(), "1 000 000 F");
        assert_eq!(Money::from_units(-7000).to_string(), "-7 000 F");
        assert_eq!(Money::zero().to_string(), "0 F");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_units(1000);
        let b = Money::from_units(500);

        assert_eq!((a + b).units(), 1500);
        assert_eq!((a - b).units(), 500);
        assert_eq!((a * 3).units(), 3000);
    }

    #[test]
    fn test_tax_calculation() {
        let amount = Money::from_units(10000);
        assert_eq!(amount.calculate_tax(TaxRate::from_bps(1800)).units(), 1800);
        assert_eq!(amount.calculate_tax(TaxRate::zero()).units(), 0);
    }

    #[test]
    fn test_tax_rounds_half_up() {
        // 25 F at 18% = 4.5 F → 5 F
        assert_eq!(Money::from_units(25).calculate_tax(TaxRate::from_bps(1800)).units(), 5);
        // 24 F at 18% = 4.32 F → 4 F
        assert_eq!(Money::from_units(24).calculate_tax(TaxRate::from_bps(1800)).units(), 4);
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(Money::from_units(-1).non_negative(), Money::zero());
        assert_eq!(Money::from_units(42).non_negative().units(), 42);
    }

    #[test]
    fn test_sum() {
        let total: Money = [1000, 2000, 3000].into_iter().map(Money::from_units).sum();
        assert_eq!(total.units(), 6000);

        let empty: Money = Vec::<Money>::new().iter().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_multiply_quantity_saturates() {
        let huge = Money::from_units(i64::MAX / 2);
        assert_eq!(huge.multiply_quantity(3).units(), i64::MAX);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_units(-100);
        assert!(negative.is_negative());
        assert!(!negative.is_positive());
    }
}
