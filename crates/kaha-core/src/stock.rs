//! # Stock Ledger View
//!
//! Pure functions answering "how much more of this product can go in the
//! cart?" from the catalog's stock figures and the lines already in the cart.
//!
//! ## One Currency: Retail Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product: rqty = 5 pc, wqty = 2 case, packaging = 3 pc/case            │
//! │                                                                         │
//! │  catalog total  = 5 + 2 × 3                 = 11 pc                    │
//! │  cart lines     = 4 pc (retail) + 2 case    = 4 + 6 = 10 pc            │
//! │  remaining      = max(0, 11 − 10)           = 1 pc                     │
//! │                                                                         │
//! │  max addable retail     = 1                                            │
//! │  max addable wholesale  = floor(1 / 3)      = 0   (no partial cases)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every path that needs committed stock (add, increase, barcode scan,
//! checkout re-check) goes through [`committed_retail_equivalent`]; there
//! is no second formula.
//!
//! ## Edit Mode Credit
//! When a persisted sale is being revised, the backend has already taken
//! that sale's units out of `rqty`/`wqty`. The lines hydrated from it would
//! otherwise be counted twice, so the view accepts a `credit`: retail units
//! the original sale already holds, added back to capacity.

use crate::cart::LineItem;
use crate::types::{Product, UnitType};

/// Converts `quantity` of `unit` into retail units. `packaging < 1` reads as 1.
pub fn retail_equivalent(unit: UnitType, quantity: i64, packaging: i64) -> i64 {
    match unit {
        UnitType::Retail => quantity,
        UnitType::Wholesale => quantity * packaging.max(1),
    }
}

/// Retail units of `product` reserved by `lines`, using the catalog's
/// current packaging ratio.
pub fn committed_retail_equivalent(product: &Product, lines: &[LineItem]) -> i64 {
    lines
        .iter()
        .filter(|line| line.product_id == product.id)
        .map(|line| product.to_retail_equivalent(line.unit_type, line.quantity))
        .sum()
}

/// Retail units of `product` still free after the cart's reservations.
pub fn available_retail_equivalent(product: &Product, lines: &[LineItem]) -> i64 {
    StockView::of(product, lines).remaining()
}

/// Largest quantity of `unit` that can still be added.
pub fn max_addable(product: &Product, unit: UnitType, lines: &[LineItem]) -> i64 {
    StockView::of(product, lines).max_addable(unit)
}

// =============================================================================
// Stock View
// =============================================================================

/// Point-in-time stock position of one product against one cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockView {
    /// `rqty + wqty × packaging` from the catalog.
    pub catalog_total: i64,
    /// Retail units held by the sale under edit (0 for new sales).
    pub credit: i64,
    /// Retail units reserved by cart lines.
    pub committed: i64,
    pub packaging: i64,
}

impl StockView {
    pub fn of(product: &Product, lines: &[LineItem]) -> Self {
        Self::with_credit(product, lines, 0)
    }

    pub fn with_credit(product: &Product, lines: &[LineItem], credit: i64) -> Self {
        StockView {
            catalog_total: product.total_retail_equivalent(),
            credit: credit.max(0),
            committed: committed_retail_equivalent(product, lines),
            packaging: product.packaging(),
        }
    }

    /// Upper bound on committed retail units.
    #[inline]
    pub fn capacity(&self) -> i64 {
        self.catalog_total + self.credit
    }

    #[inline]
    pub fn remaining(&self) -> i64 {
        (self.capacity() - self.committed).max(0)
    }

    pub fn max_addable(&self, unit: UnitType) -> i64 {
        let remaining = self.remaining();
        match unit {
            UnitType::Retail => remaining,
            UnitType::Wholesale => remaining / self.packaging,
        }
    }

    /// The conservation law: committed never exceeds capacity.
    #[inline]
    pub fn is_conserved(&self) -> bool {
        self.committed <= self.capacity()
    }
}

/// Units of `unit` left for the `(product, unit)` line once every *other*
/// line of the product is accounted for, measured against that unit type's
/// raw catalog count. Drives the cart's low-stock hint.
///
/// `credit` is retail units of this unit type held by the sale under edit.
pub fn line_available_stock(product: &Product, unit: UnitType, lines: &[LineItem], credit: i64) -> i64 {
    let packaging = product.packaging();
    let others: i64 = lines
        .iter()
        .filter(|line| line.product_id == product.id && line.unit_type != unit)
        .map(|line| product.to_retail_equivalent(line.unit_type, line.quantity))
        .sum();

    let (others_in_unit, credit_in_unit) = match unit {
        UnitType::Retail => (others, credit),
        UnitType::Wholesale => (others / packaging, credit / packaging),
    };

    (product.raw_quantity(unit) + credit_in_unit - others_in_unit).max(0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{line, product};

    #[test]
    fn test_retail_equivalent() {
        assert_eq!(retail_equivalent(UnitType::Retail, 4, 3), 4);
        assert_eq!(retail_equivalent(UnitType::Wholesale, 4, 3), 12);
        assert_eq!(retail_equivalent(UnitType::Wholesale, 4, 0), 4);
    }

    #[test]
    fn test_empty_cart_has_full_catalog() {
        let p = product(1, 5, 2, 3);
        assert_eq!(available_retail_equivalent(&p, &[]), 11);
        assert_eq!(max_addable(&p, UnitType::Retail, &[]), 11);
        assert_eq!(max_addable(&p, UnitType::Wholesale, &[]), 3);
    }

    #[test]
    fn test_committed_counts_both_unit_types() {
        let p = product(1, 5, 2, 3);
        let lines = vec![line(&p, UnitType::Retail, 4), line(&p, UnitType::Wholesale, 2)];
        assert_eq!(committed_retail_equivalent(&p, &lines), 10);
        assert_eq!(available_retail_equivalent(&p, &lines), 1);
    }

    #[test]
    fn test_other_products_are_ignored() {
        let p = product(1, 5, 2, 3);
        let other = product(2, 100, 0, 1);
        let lines = vec![line(&other, UnitType::Retail, 50)];
        assert_eq!(available_retail_equivalent(&p, &lines), 11);
    }

    #[test]
    fn test_wholesale_never_offers_partial_package() {
        let p = product(1, 7, 0, 3);
        let lines = vec![line(&p, UnitType::Retail, 2)];
        // remaining 5, 5 % 3 != 0
        assert_eq!(available_retail_equivalent(&p, &lines), 5);
        assert_eq!(max_addable(&p, UnitType::Wholesale, &lines), 1);
    }

    #[test]
    fn test_wholesale_granularity_matches_floor_for_all_remainders() {
        for rqty in 0..20 {
            let p = product(1, rqty, 0, 4);
            let remaining = available_retail_equivalent(&p, &[]);
            assert_eq!(max_addable(&p, UnitType::Wholesale, &[]), remaining / 4);
        }
    }

    #[test]
    fn test_over_committed_clamps_to_zero() {
        let p = product(1, 2, 0, 1);
        let lines = vec![line(&p, UnitType::Retail, 5)];
        let view = StockView::of(&p, &lines);
        assert_eq!(view.remaining(), 0);
        assert_eq!(view.max_addable(UnitType::Retail), 0);
        assert!(!view.is_conserved());
    }

    #[test]
    fn test_zero_packaging_reads_as_one() {
        let p = product(1, 2, 3, 0);
        assert_eq!(available_retail_equivalent(&p, &[]), 5);
        assert_eq!(max_addable(&p, UnitType::Wholesale, &[]), 5);
    }

    #[test]
    fn test_credit_extends_capacity() {
        let p = product(1, 0, 0, 2);
        let lines = vec![line(&p, UnitType::Wholesale, 5)];
        let view = StockView::with_credit(&p, &lines, 10);
        assert!(view.is_conserved());
        assert_eq!(view.remaining(), 0);

        let view = StockView::with_credit(&p, &lines, 14);
        assert_eq!(view.max_addable(UnitType::Wholesale), 2);
    }

    #[test]
    fn test_line_available_stock_subtracts_other_lines() {
        let p = product(1, 5, 2, 3);
        let lines = vec![line(&p, UnitType::Retail, 4), line(&p, UnitType::Wholesale, 1)];
        // retail: 5 − 3 (one case) = 2
        assert_eq!(line_available_stock(&p, UnitType::Retail, &lines, 0), 2);
        // wholesale: 2 − floor(4 / 3) = 1
        assert_eq!(line_available_stock(&p, UnitType::Wholesale, &lines, 0), 1);
    }
}
