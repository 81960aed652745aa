//! # VAT Breakdown
//!
//! Decomposes a cart's total into VAT-able and VAT-exempt parts.
//!
//! ## Inclusive Pricing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Shelf prices already contain 12% VAT.                                  │
//! │                                                                         │
//! │  Line 1  Coke 1.5L   ₱112.00 × 1   vatable     ─┐                      │
//! │  Line 2  Rice 1kg     ₱55.00 × 2   exempt       │                      │
//! │                                                  ▼                      │
//! │  vatable_gross    = ₱112.00                                            │
//! │  vatable_base     = 112.00 / 1.12     = ₱100.00   (rounded once)       │
//! │  vat_amount       = 112.00 − 100.00   =  ₱12.00   (by subtraction)     │
//! │  non_vatable_base = ₱110.00                                            │
//! │  total            = 112.00 + 110.00   = ₱222.00                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `vatable_base + vat_amount + non_vatable_base == total` holds exactly for
//! every cart.
//!
//! ## Rounding
//! Amounts are whole centavos. `vatable_base` is the VAT-able gross divided
//! by 1.12 and rounded half away from zero to the centavo, so the `vatable_sales` figure
//! sent to the backend is that rounded value, not the raw quotient. All
//! other fields are exact sums.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::LineItem;
use crate::money::Money;
use crate::types::TaxRate;
use crate::VAT_RATE;

/// Totals derived from a set of line items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VatBreakdown {
    /// Sum of line totals before discount. Equal to `total`.
    pub subtotal: Money,
    /// Sum of VAT-able line totals (tax included).
    pub vatable_gross: Money,
    /// VAT-able sales with the tax taken out.
    pub vatable_base: Money,
    pub vat_amount: Money,
    /// Sum of exempt line totals.
    pub non_vatable_base: Money,
    pub total: Money,
}

impl VatBreakdown {
    /// What the customer owes after the discount, never below zero.
    pub fn amount_due(&self, discount: Money) -> Money {
        (self.total - discount).non_negative()
    }
}

/// Breakdown at the standard 12% rate.
pub fn compute_breakdown(lines: &[LineItem]) -> VatBreakdown {
    compute_breakdown_at(lines, VAT_RATE)
}

pub fn compute_breakdown_at(lines: &[LineItem], rate: TaxRate) -> VatBreakdown {
    let mut vatable_gross = Money::zero();
    let mut non_vatable_base = Money::zero();

    for line in lines {
        if line.snapshot.vatable {
            vatable_gross += line.line_total();
        } else {
            non_vatable_base += line.line_total();
        }
    }

    let (vatable_base, vat_amount) = if vatable_gross.is_positive() {
        (
            vatable_gross.exclusive_of_tax(rate),
            vatable_gross.inclusive_tax(rate),
        )
    } else {
        (Money::zero(), Money::zero())
    };

    let total = vatable_gross + non_vatable_base;

    VatBreakdown {
        subtotal: total,
        vatable_gross,
        vatable_base,
        vat_amount,
        non_vatable_base,
        total,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{line, priced_product};
    use crate::types::UnitType;

    #[test]
    fn test_empty_cart_is_all_zero() {
        assert_eq!(compute_breakdown(&[]), VatBreakdown::default());
    }

    #[test]
    fn test_single_vatable_line() {
        let p = priced_product(1, 11200, true);
        let b = compute_breakdown(&[line(&p, UnitType::Retail, 1)]);

        assert_eq!(b.vatable_base, Money::from_cents(10000));
        assert_eq!(b.vat_amount, Money::from_cents(1200));
        assert_eq!(b.non_vatable_base, Money::zero());
        assert_eq!(b.total, Money::from_cents(11200));
        assert_eq!(b.subtotal, b.total);
    }

    #[test]
    fn test_base_is_rounded_to_centavo() {
        // ₱1.50 / 1.12 = ₱1.3392...
        let candy = priced_product(1, 150, true);
        let b = compute_breakdown(&[line(&candy, UnitType::Retail, 1)]);

        assert_eq!(b.vatable_base, Money::from_cents(134));
        assert_eq!(b.vat_amount, Money::from_cents(16));
        assert_eq!(b.vatable_base + b.vat_amount, b.vatable_gross);
    }

    #[test]
    fn test_mixed_lines() {
        let coke = priced_product(1, 11200, true);
        let rice = priced_product(2, 5500, false);
        let b = compute_breakdown(&[
            line(&coke, UnitType::Retail, 1),
            line(&rice, UnitType::Retail, 2),
        ]);

        assert_eq!(b.vatable_gross, Money::from_cents(11200));
        assert_eq!(b.non_vatable_base, Money::from_cents(11000));
        assert_eq!(b.total, Money::from_cents(22200));
    }

    #[test]
    fn test_exempt_only_has_no_vat() {
        let rice = priced_product(2, 5500, false);
        let b = compute_breakdown(&[line(&rice, UnitType::Retail, 3)]);
        assert_eq!(b.vatable_base, Money::zero());
        assert_eq!(b.vat_amount, Money::zero());
        assert_eq!(b.total, Money::from_cents(16500));
    }

    #[test]
    fn test_parts_sum_to_total() {
        for (cents, qty) in [(1, 1), (99, 7), (1999, 3), (33333, 11), (5, 999)] {
            let vat = priced_product(1, cents, true);
            let exempt = priced_product(2, cents + 13, false);
            let b = compute_breakdown(&[
                line(&vat, UnitType::Retail, qty),
                line(&exempt, UnitType::Retail, qty),
            ]);
            assert_eq!(b.vatable_base + b.vat_amount, b.vatable_gross);
            assert_eq!(b.vatable_base + b.vat_amount + b.non_vatable_base, b.total);
        }
    }

    #[test]
    fn test_amount_due_subtracts_discount() {
        let p = priced_product(1, 11200, true);
        let b = compute_breakdown(&[line(&p, UnitType::Retail, 1)]);
        assert_eq!(b.amount_due(Money::from_cents(1200)), Money::from_cents(10000));
    }
}
