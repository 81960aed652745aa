//! # Backend Collaborators
//!
//! The register's view of the POS backend, split by concern so each
//! orchestrator asks only for what it uses.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Suspension Points                               │
//! │                                                                         │
//! │  CatalogService          products, all-products, categories            │
//! │  CustomerDirectory       customer accounts (Credit)                    │
//! │  TransactionNumberIssuer next OR number                                │
//! │  BarcodeLookup           product + unit type for a scanned code        │
//! │  SalesGateway            checkout, load sale, update sale              │
//! │                                                                         │
//! │  PosBackend = all of the above (HttpBackend, FakeBackend in tests)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every call is made once; nothing here retries.

use async_trait::async_trait;
use kaha_core::{Category, CheckoutPayload, CustomerAccount, OriginalOrder, Product, TransactionNumber, UnitType};

use crate::error::ClientResult;

/// A barcode resolved by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BarcodeHit {
    pub product: Product,
    /// Whether the code is printed on the piece or on the package.
    pub unit: UnitType,
}

/// The backend's acknowledgement of a saved sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleReceipt {
    pub message: String,
}

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Products for the grid. `None` means every category.
    async fn fetch_products(&self, category: Option<i64>) -> ClientResult<Vec<Product>>;

    /// Every product, for the search modal.
    async fn fetch_all_products(&self) -> ClientResult<Vec<Product>>;

    async fn fetch_categories(&self) -> ClientResult<Vec<Category>>;
}

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn fetch_customers(&self) -> ClientResult<Vec<CustomerAccount>>;
}

#[async_trait]
pub trait TransactionNumberIssuer: Send + Sync {
    async fn next_transaction_number(&self) -> ClientResult<TransactionNumber>;
}

#[async_trait]
pub trait BarcodeLookup: Send + Sync {
    /// `Ok(None)` when no product carries the code.
    async fn lookup_barcode(&self, code: &str) -> ClientResult<Option<BarcodeHit>>;
}

#[async_trait]
pub trait SalesGateway: Send + Sync {
    /// Persists a new sale; the backend decrements stock.
    async fn submit_sale(&self, payload: &CheckoutPayload) -> ClientResult<SaleReceipt>;

    /// Loads a persisted sale for editing.
    async fn load_sale(&self, sale_id: i64) -> ClientResult<OriginalOrder>;

    /// Replaces a persisted sale in place.
    async fn update_sale(&self, sale_id: i64, payload: &CheckoutPayload) -> ClientResult<SaleReceipt>;
}

/// Everything the register needs from the backend.
pub trait PosBackend:
    CatalogService + CustomerDirectory + TransactionNumberIssuer + BarcodeLookup + SalesGateway
{
}

impl<T> PosBackend for T where
    T: CatalogService + CustomerDirectory + TransactionNumberIssuer + BarcodeLookup + SalesGateway
{
}
