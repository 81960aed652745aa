//! # Edit Reconciliation
//!
//! Stock validation for revising a sale that is already persisted.
//!
//! ## Net Change, Not Absolute Quantity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The backend already deducted the original sale from rqty/wqty.        │
//! │                                                                         │
//! │  original line   5 packs × 2 = 10 pc                                    │
//! │  current line    2 packs × 2 =  4 pc                                    │
//! │  net change      4 − 10      = −6 pc   → releases stock, always OK     │
//! │                                                                         │
//! │  original line   1 pack  × 2 =  2 pc                                    │
//! │  current line    4 packs × 2 =  8 pc                                    │
//! │  net change      8 − 2       = +6 pc   → must fit in the catalog       │
//! │                                                                         │
//! │  Rule (net > 0):  net ≤ catalog total − (current − net)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A line that was not on the original sale has an original of 0, so its
//! whole quantity is net new.

use crate::cart::LineItem;
use crate::catalog::Catalog;
use crate::checkout::{ShortfallReport, StockShortfall};
use crate::error::{CoreError, CoreResult};
use crate::order::{Customer, OrderDraft, OriginalOrder};
use crate::types::{PaymentMethod, Product};
use crate::validation::validate_discount;

/// `current − original` in retail units, by the catalog's packaging.
pub fn net_change(product: &Product, current: &LineItem, original: Option<&LineItem>) -> i64 {
    let current_re = product.to_retail_equivalent(current.unit_type, current.quantity);
    let original_re =
        original.map_or(0, |o| product.to_retail_equivalent(o.unit_type, o.quantity));
    current_re - original_re
}

/// Whether `current` can be saved over `original` given `product`'s stock.
/// Shrinking or unchanged lines always pass.
pub fn has_sufficient_stock_for_edit(
    product: &Product,
    current: &LineItem,
    original: Option<&LineItem>,
) -> bool {
    let net = net_change(product, current, original);
    if net <= 0 {
        return true;
    }

    let current_re = product.to_retail_equivalent(current.unit_type, current.quantity);
    net <= product.total_retail_equivalent() - (current_re - net)
}

/// Runs [`has_sufficient_stock_for_edit`] on every line, pairing each with
/// the original line of the same `(product, unit)`.
pub fn check_edit_stock(
    lines: &[LineItem],
    original: &OriginalOrder,
    catalog: &Catalog,
) -> ShortfallReport {
    lines
        .iter()
        .filter_map(|line| {
            let product = catalog.find(line.product_id)?;
            let before = original.line(line.product_id, line.unit_type);
            (!has_sufficient_stock_for_edit(product, line, before))
                .then(|| StockShortfall::new(product, line))
        })
        .collect()
}

/// Everything that must hold before an edited sale replaces the original.
///
/// `customers_available` is whether the customer list has any accounts;
/// Credit cannot be used without one.
pub fn validate_edit(
    draft: &OrderDraft,
    original: &OriginalOrder,
    catalog: &Catalog,
    customers_available: bool,
) -> CoreResult<()> {
    original.ensure_editable()?;

    if draft.cart().is_empty() {
        return Err(CoreError::EmptyCart);
    }

    validate_discount(draft.discount(), draft.breakdown().subtotal)?;

    if draft.payment_method() == PaymentMethod::Credit {
        if !customers_available {
            return Err(CoreError::NoCustomersAvailable);
        }
        if !matches!(draft.customer(), Customer::Account(_)) {
            return Err(CoreError::CustomerRequired);
        }
    }

    check_edit_stock(draft.cart().lines(), original, catalog).into_result()
}

// =============================================================================
// Unit Tests
// =============================================================================
