//! In-memory backend and fixtures for orchestrator tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use kaha_core::{
    Category, CheckoutPayload, Customer, CustomerAccount, LineItem, LineSnapshot, Money,
    OriginalOrder, PaymentMethod, Product, SaleHeader, SaleStatus, TransactionNumber, UnitType,
};

use crate::api::{
    BarcodeHit, BarcodeLookup, CatalogService, CustomerDirectory, SaleReceipt, SalesGateway,
    TransactionNumberIssuer,
};
use crate::error::{ClientError, ClientResult};

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

/// A persisted sale of `lines`, with `products` as they stood when loaded.
pub fn persisted_sale(sale_id: i64, status: SaleStatus, lines: &[(&Product, UnitType, i64)]) -> OriginalOrder {
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
            sale_id,
            status,
            transaction_number: TransactionNumber::parse("OR-000099").unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            customer: Customer::WalkIn,
            table_no: None,
            discount: Money::zero(),
            amount_tendered: Money::from_cents(50000),
            payment_method: PaymentMethod::Cash,
        },
        lines,
    )
}

/// What the fake backend holds and what it has been asked to do.
#[derive(Debug, Default)]
pub struct FakeState {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub customers: Vec<CustomerAccount>,
    pub barcodes: HashMap<String, BarcodeHit>,
    pub sales: HashMap<i64, OriginalOrder>,

    /// Last issued sequence; the next number is this + 1.
    pub sequence: u32,
    pub issuer_down: bool,
    pub catalog_down: bool,
    pub customers_down: bool,
    /// Message the backend answers checkout/update with, if it refuses.
    pub refuse_sales: Option<String>,

    pub submitted: Vec<CheckoutPayload>,
    pub updated: Vec<(i64, CheckoutPayload)>,
    pub catalog_fetches: usize,
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn with_products(products: Vec<Product>) -> Self {
        let backend = FakeBackend::default();
        backend.state().products = products;
        backend
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Overwrites the stock of a product, as another register selling would.
    pub fn set_stock(&self, product_id: i64, rqty: i64, wqty: i64) {
        let mut state = self.state();
        if let Some(p) = state.products.iter_mut().find(|p| p.id == product_id) {
            p.rqty = rqty;
            p.wqty = wqty;
        }
    }

    fn unavailable() -> ClientError {
        ClientError::Server {
            status: Some(503),
            message: "Service unavailable".to_string(),
        }
    }

    fn refusal(state: &FakeState) -> ClientResult<()> {
        match &state.refuse_sales {
            Some(message) => Err(ClientError::Server {
                status: Some(422),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogService for FakeBackend {
    async fn fetch_products(&self, category: Option<i64>) -> ClientResult<Vec<Product>> {
        let mut state = self.state();
        if state.catalog_down {
            return Err(Self::unavailable());
        }
        state.catalog_fetches += 1;
        Ok(state
            .products
            .iter()
            .filter(|p| category.map_or(true, |c| p.category_id == Some(c)))
            .cloned()
            .collect())
    }

    async fn fetch_all_products(&self) -> ClientResult<Vec<Product>> {
        self.fetch_products(None).await
    }

    async fn fetch_categories(&self) -> ClientResult<Vec<Category>> {
        Ok(self.state().categories.clone())
    }
}

#[async_trait]
impl CustomerDirectory for FakeBackend {
    async fn fetch_customers(&self) -> ClientResult<Vec<CustomerAccount>> {
        let state = self.state();
        if state.customers_down {
            return Err(Self::unavailable());
        }
        Ok(state.customers.clone())
    }
}

#[async_trait]
impl TransactionNumberIssuer for FakeBackend {
    async fn next_transaction_number(&self) -> ClientResult<TransactionNumber> {
        let mut state = self.state();
        if state.issuer_down {
            return Err(Self::unavailable());
        }
        state.sequence += 1;
        Ok(TransactionNumber::parse(&format!("OR-{:06}", state.sequence)).unwrap())
    }
}

#[async_trait]
impl BarcodeLookup for FakeBackend {
    async fn lookup_barcode(&self, code: &str) -> ClientResult<Option<BarcodeHit>> {
        Ok(self.state().barcodes.get(code).cloned())
    }
}

#[async_trait]
impl SalesGateway for FakeBackend {
    async fn submit_sale(&self, payload: &CheckoutPayload) -> ClientResult<SaleReceipt> {
        let mut state = self.state();
        Self::refusal(&state)?;
        state.submitted.push(payload.clone());
        Ok(SaleReceipt {
            message: "Order saved".to_string(),
        })
    }

    async fn load_sale(&self, sale_id: i64) -> ClientResult<OriginalOrder> {
        self.state().sales.get(&sale_id).cloned().ok_or(ClientError::Server {
            status: Some(404),
            message: "Sale not found".to_string(),
        })
    }

    async fn update_sale(&self, sale_id: i64, payload: &CheckoutPayload) -> ClientResult<SaleReceipt> {
        let mut state = self.state();
        Self::refusal(&state)?;
        state.updated.push((sale_id, payload.clone()));
        Ok(SaleReceipt {
            message: "Order updated".to_string(),
        })
    }
}
