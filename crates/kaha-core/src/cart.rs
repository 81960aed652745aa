//! # Cart Store
//!
//! The ordered list of line items making up the sale being rung up.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Store Operations                                │
//! │                                                                         │
//! │  Cashier Action           Cart Method             Gate                  │
//! │  ──────────────           ───────────             ────                  │
//! │                                                                         │
//! │  Click product ──────────► add() ───────────────► StockView::max_addable│
//! │                                                                         │
//! │  Press + ────────────────► increase() ──────────► stock warning, add()  │
//! │                                                                         │
//! │  Press − ────────────────► decrease() ──────────► floor at 1            │
//! │                                                                         │
//! │  Click remove ───────────► remove() ────────────► (none)                │
//! │                                                                         │
//! │  Load sale for editing ──► hydrate_from_order() ► (none)                │
//! │                                                                         │
//! │  NOTE: A rejected action returns Err and leaves the cart untouched.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Identity
//! A line is keyed by `(product_id, unit_type)`. The same product may sit in
//! the cart twice: once by the piece and once by the package.
//!
//! ## Conservation
//! After every successful operation, for every product:
//! `Σ retail-equivalent of its lines ≤ rqty + wqty × packaging (+ credit)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::order::OriginalOrder;
use crate::stock::{line_available_stock, retail_equivalent, StockView};
use crate::types::{Product, UnitType};
use crate::vat::{compute_breakdown, VatBreakdown};
use crate::{MAX_CART_LINES, MAX_ITEM_QUANTITY};

// =============================================================================
// Line Snapshot
// =============================================================================

/// Product data frozen onto a line when it is first added.
///
/// The catalog may be re-fetched with new prices mid-sale; the line keeps
/// charging what the cashier saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineSnapshot {
    pub name: String,
    pub retail_unit_name: String,
    pub wholesale_unit_name: String,
    /// Price of one unit of the line's unit type.
    pub unit_price: Money,
    pub vatable: bool,
    pub packaging: i64,
    pub capital: Money,
}

impl LineSnapshot {
    pub fn capture(product: &Product, unit: UnitType) -> Self {
        LineSnapshot {
            name: product.name.clone(),
            retail_unit_name: product.retail_unit_name.clone(),
            wholesale_unit_name: product.wholesale_unit_name.clone(),
            unit_price: product.price(unit),
            vatable: product.vatable,
            packaging: product.packaging(),
            capital: product.capital,
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One row of the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub product_id: i64,
    pub unit_type: UnitType,
    /// Always ≥ 1.
    pub quantity: i64,
    pub snapshot: LineSnapshot,
    /// Units of this line's type still on hand once the product's other
    /// line is accounted for. Display only.
    pub available_stock: i64,
    /// Set when the quantity exceeds the raw count of this unit type, i.e.
    /// the sale is eating into the other unit type's stock. Display only.
    pub stock_warning: bool,
}

impl LineItem {
    pub fn new(product: &Product, unit: UnitType, quantity: i64) -> Self {
        LineItem {
            product_id: product.id,
            unit_type: unit,
            quantity,
            snapshot: LineSnapshot::capture(product, unit),
            available_stock: product.raw_quantity(unit),
            stock_warning: false,
        }
    }

    /// A line rebuilt from a persisted sale. The stock the sale already
    /// holds counts as available to it.
    pub fn hydrated(
        product_id: i64,
        unit: UnitType,
        quantity: i64,
        snapshot: LineSnapshot,
        raw_quantity: i64,
    ) -> Self {
        LineItem {
            product_id,
            unit_type: unit,
            quantity,
            snapshot,
            available_stock: raw_quantity + quantity,
            stock_warning: false,
        }
    }

    #[inline]
    pub fn is(&self, product_id: i64, unit: UnitType) -> bool {
        self.product_id == product_id && self.unit_type == unit
    }

    /// `unit_price × quantity`.
    pub fn line_total(&self) -> Money {
        self.snapshot.unit_price.multiply_quantity(self.quantity)
    }

    /// Retail units this line represents, by the packaging it was sold at.
    pub fn retail_equivalent(&self) -> i64 {
        retail_equivalent(self.unit_type, self.quantity, self.snapshot.packaging)
    }

    pub fn unit_name(&self) -> &str {
        match self.unit_type {
            UnitType::Retail => &self.snapshot.retail_unit_name,
            UnitType::Wholesale => &self.snapshot.wholesale_unit_name,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The cart.
///
/// ## Invariants
/// - Lines are unique by `(product_id, unit_type)`
/// - Quantity is ≥ 1 on every line
/// - Maximum lines: 100, maximum quantity per line: 999
/// - Retail-equivalent conservation holds per product (see module docs)
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    lines: Vec<LineItem>,

    /// Quantities held by the persisted sale under edit, keyed like lines.
    /// The backend has already deducted these from `rqty`/`wqty`.
    #[serde(skip)]
    #[ts(skip)]
    held: HashMap<(i64, UnitType), i64>,

    /// Catalog entries the display fields were last computed from.
    #[serde(skip)]
    #[ts(skip)]
    stock: HashMap<i64, Product>,

    /// When the cart was created/last reset
    #[ts(as = "String")]
    created_at: DateTime<Utc>,
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            held: HashMap::new(),
            stock: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Empties the cart and forgets any edit-mode reservation.
    pub fn reset(&mut self) {
        self.lines.clear();
        self.held.clear();
        self.stock.clear();
        self.created_at = Utc::now();
    }

    /// Replaces the contents with a persisted sale's lines. Their quantities
    /// become the stock credit for the rest of the edit.
    pub fn hydrate_from_order(&mut self, order: &OriginalOrder) {
        self.reset();
        self.lines = order.lines().to_vec();
        for line in &self.lines {
            *self.held.entry((line.product_id, line.unit_type)).or_insert(0) += line.quantity;
        }
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line(&self, product_id: i64, unit: UnitType) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.is(product_id, unit))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Quantity of `unit` the sale under edit already holds (0 for new sales).
    pub fn held_quantity(&self, product_id: i64, unit: UnitType) -> i64 {
        self.held.get(&(product_id, unit)).copied().unwrap_or(0)
    }

    /// Stock position of `product` against this cart, edit credit included.
    pub fn stock_view(&self, product: &Product) -> StockView {
        let credit = [UnitType::Retail, UnitType::Wholesale]
            .into_iter()
            .map(|unit| product.to_retail_equivalent(unit, self.held_quantity(product.id, unit)))
            .sum();
        StockView::with_credit(product, &self.lines, credit)
    }

    pub fn breakdown(&self) -> VatBreakdown {
        compute_breakdown(&self.lines)
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary::from(self)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds `quantity` of `unit`, merging into an existing line.
    ///
    /// ## Rejections (no mutation)
    /// - `quantity ≤ 0`
    /// - nothing of the product left once the cart is accounted for
    /// - first line of a unit type whose raw catalog count is zero
    /// - more than [`StockView::max_addable`]
    /// - line or cart caps exceeded
    pub fn add(&mut self, product: &Product, unit: UnitType, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(CoreError::InvalidQuantity { quantity });
        }

        let view = self.stock_view(product);
        if view.remaining() == 0 {
            return Err(CoreError::OutOfStock {
                name: product.name.clone(),
            });
        }

        let existing = self.position(product.id, unit);
        if existing.is_none() {
            if product.raw_quantity(unit) + self.held_quantity(product.id, unit) <= 0 {
                return Err(CoreError::UnitTypeUnavailable {
                    name: product.name.clone(),
                    unit,
                });
            }
            if self.lines.len() >= MAX_CART_LINES {
                return Err(CoreError::CartTooLarge {
                    max: MAX_CART_LINES,
                });
            }
        }

        let max = view.max_addable(unit);
        if quantity > max {
            return Err(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: max,
                unit,
            });
        }

        let current = existing.map_or(0, |i| self.lines[i].quantity);
        let new_quantity = current + quantity;
        if new_quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: new_quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        match existing {
            Some(i) => self.lines[i].quantity = new_quantity,
            None => self.lines.push(LineItem::new(product, unit, quantity)),
        }
        self.refresh_product(product);
        Ok(())
    }

    /// Adds one to an existing line.
    ///
    /// Refused once the line is flagged and already at its available stock.
    pub fn increase(&mut self, product: &Product, unit: UnitType) -> CoreResult<()> {
        let line = self
            .line(product.id, unit)
            .ok_or(CoreError::LineNotFound {
                product_id: product.id,
            })?;

        if line.stock_warning && line.quantity >= line.available_stock {
            return Err(CoreError::StockLimitReached {
                name: product.name.clone(),
                available: line.available_stock,
            });
        }

        self.add(product, unit, 1)
    }

    /// Takes one off the first line of `product_id`. A line at 1 stays at 1.
    pub fn decrease(&mut self, product_id: i64) -> CoreResult<()> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or(CoreError::LineNotFound { product_id })?;

        if line.quantity > 1 {
            line.quantity -= 1;
            line.stock_warning = false;
        }
        Ok(())
    }

    /// Drops the `(product_id, unit)` line, returning it if it was there.
    ///
    /// The product's other line, if any, gets its display fields recomputed
    /// against the catalog entry last seen for it.
    pub fn remove(&mut self, product_id: i64, unit: UnitType) -> Option<LineItem> {
        let index = self.position(product_id, unit)?;
        let removed = self.lines.remove(index);
        if let Some(product) = self.stock.get(&product_id).cloned() {
            self.refresh_product(&product);
        }
        Some(removed)
    }

    /// Recomputes `available_stock` / `stock_warning` on `product`'s lines
    /// from a (possibly newer) catalog entry.
    pub fn refresh(&mut self, product: &Product) {
        self.refresh_product(product);
    }

    fn position(&self, product_id: i64, unit: UnitType) -> Option<usize> {
        self.lines.iter().position(|l| l.is(product_id, unit))
    }

    /// Recomputes the display fields on every line of `product`.
    fn refresh_product(&mut self, product: &Product) {
        let updates: Vec<(usize, i64, bool)> = self
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.product_id == product.id)
            .map(|(i, line)| {
                let unit = line.unit_type;
                let held = self.held_quantity(product.id, unit);
                let credit = product.to_retail_equivalent(unit, held);
                let available = line_available_stock(product, unit, &self.lines, credit);
                let warning = line.quantity > product.raw_quantity(unit) + held;
                (i, available, warning)
            })
            .collect();

        for (i, available, warning) in updates {
            self.lines[i].available_stock = available;
            self.lines[i].stock_warning = warning;
        }
        self.stock.insert(product.id, product.clone());
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

/// Cart totals summary for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartSummary {
    pub line_count: usize,
    pub total_quantity: i64,
    pub retail_equivalent_units: i64,
    pub breakdown: VatBreakdown,
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        CartSummary {
            line_count: cart.len(),
            total_quantity: cart.lines.iter().map(|l| l.quantity).sum(),
            retail_equivalent_units: cart.lines.iter().map(LineItem::retail_equivalent).sum(),
            breakdown: cart.breakdown(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
