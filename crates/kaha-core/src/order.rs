//! # Orders
//!
//! The sale being built ([`OrderDraft`]) and, in edit mode, the persisted
//! sale it started from ([`OriginalOrder`]).
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  NEW SALE                                                               │
//! │  issue number ──► OrderDraft::new ──► cart ops ──► submit ──┐          │
//! │       ▲                                                     │          │
//! │       └──────────────── reset(new number) ◄─────────────────┘          │
//! │                                                                         │
//! │  EDIT SALE                                                              │
//! │  load sale ──► OriginalOrder ──► to_draft() ──► cart ops ──► update ─┐ │
//! │                     ▲                                                │ │
//! │                     └──────────── reload from backend ◄──────────────┘ │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An `OriginalOrder` is never mutated; it is the baseline every edit is
//! reconciled against.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::cart::{Cart, LineItem};
use crate::checkout::compute_change;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CustomerAccount, OrderMode, PaymentMethod, SaleStatus, UnitType};
use crate::validation::{
    validate_amount_tendered, validate_customer_name, validate_discount, validate_table_no,
    validate_transaction_number,
};
use crate::vat::VatBreakdown;

// =============================================================================
// Transaction Number
// =============================================================================

/// `PREFIX-SEQ`, e.g. `"OR-000123"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(transparent)]
pub struct TransactionNumber(String);

impl TransactionNumber {
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let raw = raw.trim();
        validate_transaction_number(raw)?;
        Ok(TransactionNumber(raw.to_string()))
    }

    /// Number used when the issuer is unreachable: `<prefix>-<unix millis>`.
    pub fn local_fallback(prefix: &str, at: DateTime<Utc>) -> Self {
        TransactionNumber(format!("{}-{}", prefix, at.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before the first `-`, or the whole number when there is none.
    pub fn prefix(&self) -> &str {
        self.0.split_once('-').map_or(self.0.as_str(), |(prefix, _)| prefix)
    }

    /// Part after the first `-`, or the whole number when there is none.
    pub fn sequence(&self) -> &str {
        self.0.split_once('-').map_or(self.0.as_str(), |(_, seq)| seq)
    }

    /// True for numbers made by [`TransactionNumber::local_fallback`] with
    /// `local_prefix` (the terminal's configured fallback prefix).
    pub fn is_local(&self, local_prefix: &str) -> bool {
        self.0.contains('-') && self.prefix() == local_prefix
    }
}

impl fmt::Display for TransactionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Who the sale is for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Customer {
    #[default]
    WalkIn,
    /// Free-text name typed by the cashier.
    Named(String),
    /// A customer account; required for Credit.
    Account(CustomerAccount),
}

impl Customer {
    /// Blank names mean a walk-in.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() {
            Customer::WalkIn
        } else {
            Customer::Named(name.to_string())
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            Customer::WalkIn => None,
            Customer::Named(name) => Some(name),
            Customer::Account(account) => Some(&account.name),
        }
    }

    pub fn account_id(&self) -> Option<i64> {
        match self {
            Customer::Account(account) => Some(account.id),
            Customer::WalkIn | Customer::Named(_) => None,
        }
    }
}

// =============================================================================
// Order Draft
// =============================================================================

/// The sale currently on the register: header fields plus the cart.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDraft {
    mode: OrderMode,
    transaction_number: TransactionNumber,
    #[ts(as = "String")]
    date: NaiveDate,
    customer: Customer,
    table_no: Option<String>,
    discount: Money,
    amount_tendered: Money,
    payment_method: PaymentMethod,
    cart: Cart,
}

impl OrderDraft {
    /// An empty new sale.
    pub fn new(transaction_number: TransactionNumber, date: NaiveDate) -> Self {
        OrderDraft {
            mode: OrderMode::New,
            transaction_number,
            date,
            customer: Customer::WalkIn,
            table_no: None,
            discount: Money::zero(),
            amount_tendered: Money::zero(),
            payment_method: PaymentMethod::default(),
            cart: Cart::new(),
        }
    }

    /// Clears everything for the next sale.
    pub fn reset(&mut self, transaction_number: TransactionNumber, date: NaiveDate) {
        *self = OrderDraft::new(transaction_number, date);
    }

    pub fn mode(&self) -> OrderMode {
        self.mode
    }

    pub fn transaction_number(&self) -> &TransactionNumber {
        &self.transaction_number
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn table_no(&self) -> Option<&str> {
        self.table_no.as_deref()
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    pub fn amount_tendered(&self) -> Money {
        self.amount_tendered
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
    }

    pub fn set_customer_name(&mut self, name: &str) -> CoreResult<()> {
        validate_customer_name(name)?;
        self.customer = Customer::from_name(name);
        Ok(())
    }

    pub fn select_customer(&mut self, account: CustomerAccount) {
        self.customer = Customer::Account(account);
    }

    pub fn set_table_no(&mut self, table_no: &str) -> CoreResult<()> {
        validate_table_no(table_no)?;
        let table_no = table_no.trim();
        self.table_no = (!table_no.is_empty()).then(|| table_no.to_string());
        Ok(())
    }

    /// Discount must stay within `0..=subtotal`.
    pub fn set_discount(&mut self, discount: Money) -> CoreResult<()> {
        validate_discount(discount, self.breakdown().subtotal)?;
        self.discount = discount;
        Ok(())
    }

    pub fn set_amount_tendered(&mut self, amount: Money) -> CoreResult<()> {
        validate_amount_tendered(amount)?;
        self.amount_tendered = amount;
        Ok(())
    }

    /// Credit is only offered in edit mode. Leaving Credit drops a selected
    /// customer account back to a walk-in.
    pub fn set_payment_method(&mut self, method: PaymentMethod) -> CoreResult<()> {
        if !method.allowed_in(self.mode) {
            return Err(CoreError::PaymentMethodNotAllowed { method });
        }
        if method != PaymentMethod::Credit && matches!(self.customer, Customer::Account(_)) {
            self.customer = Customer::WalkIn;
        }
        self.payment_method = method;
        Ok(())
    }

    pub fn breakdown(&self) -> VatBreakdown {
        self.cart.breakdown()
    }

    /// `total − discount`, never below zero.
    pub fn amount_due(&self) -> Money {
        self.breakdown().amount_due(self.discount)
    }

    /// Change owed to the customer. Always zero for Credit.
    pub fn change(&self) -> Money {
        if self.payment_method.takes_tender() {
            compute_change(self.amount_tendered, self.amount_due())
        } else {
            Money::zero()
        }
    }
}

// =============================================================================
// Original Order
// =============================================================================

/// Header of a persisted sale, as loaded for editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleHeader {
    pub sale_id: i64,
    pub status: SaleStatus,
    pub transaction_number: TransactionNumber,
    pub date: NaiveDate,
    pub customer: Customer,
    pub table_no: Option<String>,
    pub discount: Money,
    pub amount_tendered: Money,
    pub payment_method: PaymentMethod,
}

/// Immutable snapshot of a persisted sale; the baseline for reconciling an
/// edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginalOrder {
    header: SaleHeader,
    lines: Vec<LineItem>,
}

impl OriginalOrder {
    pub fn new(header: SaleHeader, lines: Vec<LineItem>) -> Self {
        OriginalOrder { header, lines }
    }

    pub fn header(&self) -> &SaleHeader {
        &self.header
    }

    pub fn sale_id(&self) -> i64 {
        self.header.sale_id
    }

    pub fn status(&self) -> SaleStatus {
        self.header.status
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line(&self, product_id: i64, unit: UnitType) -> Option<&LineItem> {
        self.lines.iter().find(|l| l.is(product_id, unit))
    }

    pub fn is_editable(&self) -> bool {
        self.header.status.is_editable()
    }

    pub fn ensure_editable(&self) -> CoreResult<()> {
        if self.is_editable() {
            Ok(())
        } else {
            Err(CoreError::OrderNotEditable {
                transaction_number: self.header.transaction_number.to_string(),
                status: self.header.status,
            })
        }
    }

    /// An edit-mode draft seeded with this sale's header and lines.
    pub fn to_draft(&self) -> OrderDraft {
        let header = &self.header;
        let mut cart = Cart::new();
        cart.hydrate_from_order(self);

        OrderDraft {
            mode: OrderMode::Edit,
            transaction_number: header.transaction_number.clone(),
            date: header.date,
            customer: header.customer.clone(),
            table_no: header.table_no.clone(),
            discount: header.discount,
            amount_tendered: header.amount_tendered,
            payment_method: header.payment_method,
            cart,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
