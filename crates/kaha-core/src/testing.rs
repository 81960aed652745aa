//! Shared fixtures for unit tests.

use chrono::NaiveDate;

use crate::cart::{LineItem, LineSnapshot};
use crate::money::Money;
use crate::order::{Customer, OrderDraft, OriginalOrder, SaleHeader, TransactionNumber};
use crate::types::{PaymentMethod, Product, SaleStatus, UnitType};

/// ₱20.00 a piece, ₱220.00 a case, VAT-able.
pub fn product(id: i64, rqty: i64, wqty: i64, packaging: i64) -> Product {
    Product {
        id,
        name: format!("Product {}", id),
        barcode: Some(format!("48000{}", id)),
        category_id: Some(1),
        retail_unit_name: "pc".to_string(),
        wholesale_unit_name: "case".to_string(),
        retail_price: Money::from_cents(2000),
        wholesale_price: Money::from_cents(22000),
        packaging,
        rqty,
        wqty,
        vatable: true,
        capital: Money::from_cents(1500),
    }
}

/// Plenty of stock, retail price `cents`.
pub fn priced_product(id: i64, cents: i64, vatable: bool) -> Product {
    Product {
        retail_price: Money::from_cents(cents),
        vatable,
        ..product(id, 10_000, 0, 1)
    }
}

pub fn line(product: &Product, unit: UnitType, quantity: i64) -> LineItem {
    LineItem::new(product, unit, quantity)
}

pub fn sale_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

pub fn new_draft() -> OrderDraft {
    OrderDraft::new(TransactionNumber::parse("OR-000123").unwrap(), sale_date())
}

/// A paid sale holding the given lines, as loaded from the backend.
pub fn original_order(lines: &[(&Product, UnitType, i64)]) -> OriginalOrder {
    let lines = lines
        .iter()
        .map(|(product, unit, quantity)| {
            LineItem::hydrated(
                product.id,
                *unit,
                *quantity,
                LineSnapshot::capture(product, *unit),
                product.raw_quantity(*unit),
            )
        })
        .collect();

    OriginalOrder::new(
        SaleHeader {
            sale_id: 42,
            status: SaleStatus::Paid,
            transaction_number: TransactionNumber::parse("OR-000099").unwrap(),
            date: sale_date(),
            customer: Customer::WalkIn,
            table_no: None,
            discount: Money::zero(),
            amount_tendered: Money::from_cents(50000),
            payment_method: PaymentMethod::Cash,
        },
        lines,
    )
}
