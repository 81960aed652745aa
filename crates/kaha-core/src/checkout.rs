//! # Checkout
//!
//! Bulk validation of a finished cart and the payload sent to the backend.
//!
//! ## Submission Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Checkout Validation                             │
//! │                                                                         │
//! │  validate_submission(draft, fresh catalog, kind)                        │
//! │       │                                                                 │
//! │       ├── cart empty? ───────────────────────► EmptyCart               │
//! │       │                                                                 │
//! │       ├── discount over subtotal? ───────────► Validation              │
//! │       │                                                                 │
//! │       ├── Complete and tender ≤ 0 or < due? ─► InsufficientTender      │
//! │       │                                                                 │
//! │       ├── any product over its stock? ───────► StockShortfall(report)  │
//! │       │                                                                 │
//! │       └── OK ──► CheckoutPayload::for_new_sale(...) ──► backend        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock check here runs against a catalog fetched *at submission
//! time*; the cart's own gates only ever saw the catalog from when items
//! were added.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::cart::LineItem;
use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::order::{OrderDraft, TransactionNumber};
use crate::stock::committed_retail_equivalent;
use crate::types::{PaymentMethod, Product, SaleStatus, UnitType};
use crate::validation::validate_discount;
use crate::vat::VatBreakdown;

// =============================================================================
// Submission Kind
// =============================================================================

/// How a new sale leaves the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    /// Paid in full now.
    Complete,
    /// Saved unpaid; no tender taken.
    HoldForLater,
}

impl SubmissionKind {
    pub const fn status(&self) -> SaleStatus {
        match self {
            SubmissionKind::Complete => SaleStatus::Paid,
            SubmissionKind::HoldForLater => SaleStatus::Unpaid,
        }
    }

    pub const fn takes_tender(&self) -> bool {
        matches!(self, SubmissionKind::Complete)
    }
}

// =============================================================================
// Tender
// =============================================================================

/// `max(0, tendered − due)`.
pub fn compute_change(amount_tendered: Money, amount_due: Money) -> Money {
    (amount_tendered - amount_due).non_negative()
}

/// A complete sale needs a positive tender covering the amount due.
pub fn validate_tender(amount_tendered: Money, amount_due: Money) -> CoreResult<()> {
    if !amount_tendered.is_positive() || amount_tendered < amount_due {
        return Err(CoreError::InsufficientTender {
            tendered: amount_tendered,
            due: amount_due,
        });
    }
    Ok(())
}

// =============================================================================
// Stock Shortfall
// =============================================================================

/// One line the backend could no longer fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockShortfall {
    pub product_id: i64,
    pub name: String,
    pub unit_type: UnitType,
    pub requested_quantity: i64,
    pub packaging: i64,
    pub retail_unit_name: String,
    pub wholesale_unit_name: String,
    /// `rqty` in the fresh catalog.
    pub available_retail: i64,
    /// `wqty` in the fresh catalog.
    pub available_wholesale: i64,
}

impl StockShortfall {
    pub fn new(product: &Product, line: &LineItem) -> Self {
        StockShortfall {
            product_id: product.id,
            name: product.name.clone(),
            unit_type: line.unit_type,
            requested_quantity: line.quantity,
            packaging: product.packaging(),
            retail_unit_name: product.retail_unit_name.clone(),
            wholesale_unit_name: product.wholesale_unit_name.clone(),
            available_retail: product.rqty,
            available_wholesale: product.wqty,
        }
    }

    /// e.g. `"4 pc"` or `"2 box (6 pc)"`.
    pub fn requested_description(&self) -> String {
        match self.unit_type {
            UnitType::Retail => format!("{} {}", self.requested_quantity, self.retail_unit_name),
            UnitType::Wholesale => format!(
                "{} {} ({} {})",
                self.requested_quantity,
                self.wholesale_unit_name,
                self.requested_quantity * self.packaging,
                self.retail_unit_name
            ),
        }
    }

    /// e.g. `"1 pc + 0 box (0 pc)"`.
    pub fn available_description(&self) -> String {
        format!(
            "{} {} + {} {} ({} {})",
            self.available_retail,
            self.retail_unit_name,
            self.available_wholesale,
            self.wholesale_unit_name,
            self.available_wholesale * self.packaging,
            self.retail_unit_name
        )
    }
}

impl fmt::Display for StockShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: Needed {}, Available {}",
            self.name,
            self.requested_description(),
            self.available_description()
        )
    }
}

/// Every shortfall found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShortfallReport {
    items: Vec<StockShortfall>,
}

impl ShortfallReport {
    pub fn items(&self) -> &[StockShortfall] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn push(&mut self, shortfall: StockShortfall) {
        self.items.push(shortfall);
    }

    /// `Ok` when nothing fell short.
    pub fn into_result(self) -> CoreResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::StockShortfall(self))
        }
    }
}

impl FromIterator<StockShortfall> for ShortfallReport {
    fn from_iter<I: IntoIterator<Item = StockShortfall>>(iter: I) -> Self {
        ShortfallReport {
            items: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ShortfallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}

/// Re-checks every line against `catalog`.
///
/// A line is short when its product's lines together need more retail
/// units than the catalog now holds. Lines whose product has vanished from
/// the catalog are left for the backend to judge.
pub fn check_stock(lines: &[LineItem], catalog: &Catalog) -> ShortfallReport {
    lines
        .iter()
        .filter_map(|line| {
            let product = catalog.find(line.product_id)?;
            let needed = committed_retail_equivalent(product, lines);
            (needed > product.total_retail_equivalent()).then(|| StockShortfall::new(product, line))
        })
        .collect()
}

/// Everything that must hold before a new sale is sent.
pub fn validate_submission(
    draft: &OrderDraft,
    catalog: &Catalog,
    kind: SubmissionKind,
) -> CoreResult<()> {
    if draft.cart().is_empty() {
        return Err(CoreError::EmptyCart);
    }

    // lines may have shrunk since the discount was entered
    validate_discount(draft.discount(), draft.breakdown().subtotal)?;

    if kind.takes_tender() {
        validate_tender(draft.amount_tendered(), draft.amount_due())?;
    }

    check_stock(draft.cart().lines(), catalog).into_result()
}

// =============================================================================
// Payload
// =============================================================================

/// A sale as the backend persists it. Doubles as receipt data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutPayload {
    pub transaction_number: TransactionNumber,
    pub date: NaiveDate,
    /// Absent on updates; the backend keeps the stored status.
    pub status: Option<SaleStatus>,
    pub breakdown: VatBreakdown,
    pub discount: Money,
    pub amount_tendered: Money,
    pub change: Money,
    pub customer: Option<String>,
    pub customer_id: Option<i64>,
    pub table_no: Option<String>,
    pub payment_method: PaymentMethod,
    pub lines: Vec<PayloadLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadLine {
    pub product_id: i64,
    pub name: String,
    pub capital: Money,
    pub price: Money,
    pub unit_type: UnitType,
    pub unit_name: String,
    pub quantity: i64,
    pub subtotal: Money,
    pub vatable: bool,
    pub packaging: i64,
    pub retail_equivalent: i64,
}

impl CheckoutPayload {
    /// Payload for a new sale. Holding for later zeroes tender and change.
    pub fn for_new_sale(draft: &OrderDraft, catalog: &Catalog, kind: SubmissionKind) -> Self {
        Self::build(draft, catalog, Some(kind.status()), kind.takes_tender())
    }

    /// Payload replacing a persisted sale. Credit zeroes tender and change.
    pub fn for_update(draft: &OrderDraft, catalog: &Catalog) -> Self {
        Self::build(draft, catalog, None, draft.payment_method().takes_tender())
    }

    fn build(
        draft: &OrderDraft,
        catalog: &Catalog,
        status: Option<SaleStatus>,
        takes_tender: bool,
    ) -> Self {
        let breakdown = draft.breakdown();
        let (amount_tendered, change) = if takes_tender {
            (
                draft.amount_tendered(),
                compute_change(draft.amount_tendered(), breakdown.amount_due(draft.discount())),
            )
        } else {
            (Money::zero(), Money::zero())
        };

        let lines = draft
            .cart()
            .lines()
            .iter()
            .map(|line| PayloadLine::from_line(line, catalog.find(line.product_id)))
            .collect();

        CheckoutPayload {
            transaction_number: draft.transaction_number().clone(),
            date: draft.date(),
            status,
            breakdown,
            discount: draft.discount(),
            amount_tendered,
            change,
            customer: draft.customer().display_name().map(str::to_string),
            customer_id: draft.customer().account_id(),
            table_no: draft.table_no().map(str::to_string),
            payment_method: draft.payment_method(),
            lines,
        }
    }
}

impl PayloadLine {
    /// Packaging comes from the current catalog when the product is there,
    /// so the retail-equivalent matches the backend's stock deduction.
    fn from_line(line: &LineItem, product: Option<&Product>) -> Self {
        let packaging = product.map_or(line.snapshot.packaging, Product::packaging);
        PayloadLine {
            product_id: line.product_id,
            name: line.snapshot.name.clone(),
            capital: line.snapshot.capital,
            price: line.snapshot.unit_price,
            unit_type: line.unit_type,
            unit_name: line.unit_name().to_string(),
            quantity: line.quantity,
            subtotal: line.line_total(),
            vatable: line.snapshot.vatable,
            packaging,
            retail_equivalent: crate::stock::retail_equivalent(line.unit_type, line.quantity, packaging),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
