//! # Money Module
//!
//! Provides the `Money` type for handling peso amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  VAT-inclusive prices are divided by 1.12 to find the taxable base:    │
//! │    112.00 / 1.12 = 100.00000000000001  ❌ WRONG!                        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centavos                                         │
//! │    11200 × 10000 / 11200 = 10000 centavos, exactly                     │
//! │    VAT = gross − base, so base + VAT == gross ALWAYS                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kaha_core::money::Money;
//!
//! let price = Money::from_cents(11200); // ₱112.00
//! let doubled = price * 2;              // ₱224.00
//! let total = price + Money::from_cents(50); // ₱112.50
//! assert_eq!(total.cents(), 11250);
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

/// A monetary value in centavos (1/100 of a peso).
///
/// ## Design Decisions
/// - **i64 (signed)**: differences such as `tendered − due` may go negative
///   before they are clamped
/// - **Single field tuple struct**: zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// Product.retail_price ──► LineSnapshot.unit_price ──► LineItem::line_total
///                                                            │
///                                  VatBreakdown (gross / base / VAT) ◄──┘
///                                            │
///                    OrderDraft: total − discount ──► change
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use kaha_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // ₱10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from pesos and centavos.
    ///
    /// For negative amounts only the peso part should be negative:
    /// `from_major_minor(-5, 50)` is -₱5.50.
    ///
    /// ```rust
    /// use kaha_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 99).cents(), 1099);
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

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-peso portion.
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavo portion (always 0-99).
    #[inline]
    pub const fn centavos_part(&self) -> i64 {
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
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use kaha_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Removes an inclusive tax from this amount, returning the taxable base.
    ///
    /// This models VAT-inclusive shelf prices: the amount already contains
    /// the tax, so the base is `amount / (1 + rate)`. The base is the only
    /// rounded value (half away from zero, to the centavo).
    ///
    /// ```rust
    /// use kaha_core::money::Money;
    /// use kaha_core::types::TaxRate;
    ///
    /// let gross = Money::from_cents(11200); // ₱112.00
    /// let base = gross.exclusive_of_tax(TaxRate::from_bps(1200));
    /// assert_eq!(base.cents(), 10000); // ₱100.00
    /// ```
    pub fn exclusive_of_tax(&self, rate: TaxRate) -> Money {
        // Use i128 to prevent overflow on large amounts
        let numerator = self.0 as i128 * 10_000;
        let denominator = 10_000 + rate.bps() as i128;
        Money::from_cents(round_div(numerator, denominator) as i64)
    }

    /// Returns the tax already contained in this VAT-inclusive amount.
    ///
    /// Always computed as `self − exclusive_of_tax(rate)`, so the two parts
    /// add back up to the original amount without drift.
    ///
    /// ```rust
    /// use kaha_core::money::Money;
    /// use kaha_core::types::TaxRate;
    ///
    /// let gross = Money::from_cents(11200);
    /// assert_eq!(gross.inclusive_tax(TaxRate::from_bps(1200)).cents(), 1200);
    /// ```
    pub fn inclusive_tax(&self, rate: TaxRate) -> Money {
        *self - self.exclusive_of_tax(rate)
    }
}

/// Integer division rounding half away from zero. `denominator` must be > 0.
fn round_div(numerator: i128, denominator: i128) -> i128 {
    if numerator >= 0 {
        (2 * numerator + denominator) / (2 * denominator)
    } else {
        -((-2 * numerator + denominator) / (2 * denominator))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `₱12.34`. For debugging and receipts; the frontend owns
/// localized display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}₱{}.{:02}",
            sign,
            self.pesos().abs(),
            self.centavos_part()
        )
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

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
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
    use crate::VAT_RATE;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.pesos(), 10);
        assert_eq!(money.centavos_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "₱10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "₱5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-₱5.50");
        assert_eq!(format!("{}", Money::zero()), "₱0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_non_negative_clamps() {
        assert_eq!(Money::from_cents(-1).non_negative(), Money::zero());
        assert_eq!(Money::from_cents(7).non_negative().cents(), 7);
    }

    #[test]
    fn test_exclusive_of_tax_exact() {
        let gross = Money::from_cents(11200);
        assert_eq!(gross.exclusive_of_tax(VAT_RATE).cents(), 10000);
        assert_eq!(gross.inclusive_tax(VAT_RATE).cents(), 1200);
    }

    #[test]
    fn test_exclusive_of_tax_rounds_half_away_from_zero() {
        // ₱1.00 / 1.12 = 0.892857… → 89 centavos
        let gross = Money::from_cents(100);
        assert_eq!(gross.exclusive_of_tax(VAT_RATE).cents(), 89);
        assert_eq!(gross.inclusive_tax(VAT_RATE).cents(), 11);

        let negative = Money::from_cents(-100);
        assert_eq!(negative.exclusive_of_tax(VAT_RATE).cents(), -89);
    }

    /// The decomposition must never leak a centavo, whatever the amount.
    #[test]
    fn test_inclusive_split_is_lossless() {
        for cents in [1, 7, 99, 1_234, 55_555, 1_000_001] {
            let gross = Money::from_cents(cents);
            let base = gross.exclusive_of_tax(VAT_RATE);
            let tax = gross.inclusive_tax(VAT_RATE);
            assert_eq!(base + tax, gross, "split of {} drifted", gross);
        }
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
    }
}
