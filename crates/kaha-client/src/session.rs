//! # Cart Session
//!
//! The catalog as last fetched plus the draft on the register, with every
//! cashier action routed through the engine's gates.
//!
//! ## Action Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cart Session Operations                            │
//! │                                                                         │
//! │  Cashier Action           Session Method          Engine Call           │
//! │  ──────────────           ──────────────          ───────────           │
//! │                                                                         │
//! │  Tap product ────────────► add_item() ──────────► Cart::add            │
//! │  Pick from search ───────► add_product() ───────► upsert + Cart::add   │
//! │  Scan barcode ───────────► scan_barcode() ──────► pre-gates + add      │
//! │  Tap + / − ──────────────► increase / decrease ─► Cart::increase/...   │
//! │  Tap trash ──────────────► remove_item() ───────► Cart::remove         │
//! │  Switch category tab ────► select_category() ──► refetch catalog      │
//! │                                                                         │
//! │  A refused action is logged at WARN and leaves the cart untouched.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use kaha_core::validation::validate_search_query;
use kaha_core::{Cart, Catalog, CoreError, LineItem, OrderDraft, Product, UnitType};
use tracing::{debug, info, warn};

use crate::api::{BarcodeLookup, CatalogService};
use crate::error::ClientResult;

/// Catalog + draft for one register screen.
#[derive(Debug, Clone)]
pub struct CartSession {
    catalog: Catalog,
    draft: OrderDraft,
    category: Option<i64>,
}

impl CartSession {
    pub fn new(draft: OrderDraft, catalog: Catalog, category: Option<i64>) -> Self {
        CartSession {
            catalog,
            draft,
            category,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut OrderDraft {
        &mut self.draft
    }

    pub fn cart(&self) -> &Cart {
        self.draft.cart()
    }

    /// Category the grid is filtered by; `None` is the "hot" tab.
    pub fn category(&self) -> Option<i64> {
        self.category
    }

    pub(crate) fn replace_draft(&mut self, draft: OrderDraft) {
        self.draft = draft;
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Re-reads the grid for the current category.
    pub async fn refresh_catalog<C>(&mut self, backend: &C) -> ClientResult<()>
    where
        C: CatalogService + ?Sized,
    {
        let products = backend.fetch_products(self.category).await?;
        debug!(count = products.len(), category = ?self.category, "Catalog refreshed");
        self.catalog.replace(products);
        Ok(())
    }

    /// Switches the grid to `category` (`None` for every product).
    pub async fn select_category<C>(&mut self, backend: &C, category: Option<i64>) -> ClientResult<()>
    where
        C: CatalogService + ?Sized,
    {
        self.category = category;
        self.refresh_catalog(backend).await
    }

    /// Product search modal: every product, filtered by name or barcode.
    pub async fn search<C>(&self, backend: &C, query: &str) -> ClientResult<Vec<Product>>
    where
        C: CatalogService + ?Sized,
    {
        let query = validate_search_query(query).map_err(CoreError::from)?;
        let all = Catalog::new(backend.fetch_all_products().await?);
        Ok(all.search(&query).into_iter().cloned().collect())
    }

    // =========================================================================
    // Cart Actions
    // =========================================================================

    fn product(&self, product_id: i64) -> Result<Product, CoreError> {
        self.catalog
            .find(product_id)
            .cloned()
            .ok_or(CoreError::ProductNotFound(product_id))
    }

    fn rejected<T>(action: &str, product_id: i64, err: CoreError) -> ClientResult<T> {
        warn!(action, product_id, reason = %err, "Cart action rejected");
        Err(err.into())
    }

    /// Adds a product shown on the grid.
    pub fn add_item(&mut self, product_id: i64, unit: UnitType, quantity: i64) -> ClientResult<()> {
        let product = match self.product(product_id) {
            Ok(product) => product,
            Err(err) => return Self::rejected("add", product_id, err),
        };
        self.add_resolved(&product, unit, quantity)
    }

    /// Adds a product picked outside the grid (search modal, barcode). It
    /// joins the catalog so later actions on its line can find it.
    pub fn add_product(&mut self, product: Product, unit: UnitType, quantity: i64) -> ClientResult<()> {
        self.catalog.upsert(product.clone());
        self.add_resolved(&product, unit, quantity)
    }

    fn add_resolved(&mut self, product: &Product, unit: UnitType, quantity: i64) -> ClientResult<()> {
        match self.draft.cart_mut().add(product, unit, quantity) {
            Ok(()) => {
                debug!(product_id = product.id, %unit, quantity, "Added to cart");
                Ok(())
            }
            Err(err) => Self::rejected("add", product.id, err),
        }
    }

    pub fn increase_item(&mut self, product_id: i64, unit: UnitType) -> ClientResult<()> {
        let result = self
            .product(product_id)
            .and_then(|product| self.draft.cart_mut().increase(&product, unit));
        match result {
            Ok(()) => Ok(()),
            Err(err) => Self::rejected("increase", product_id, err),
        }
    }

    pub fn decrease_item(&mut self, product_id: i64) -> ClientResult<()> {
        match self.draft.cart_mut().decrease(product_id) {
            Ok(()) => Ok(()),
            Err(err) => Self::rejected("decrease", product_id, err),
        }
    }

    pub fn remove_item(&mut self, product_id: i64, unit: UnitType) -> ClientResult<LineItem> {
        match self.draft.cart_mut().remove(product_id, unit) {
            Some(line) => {
                if let Some(product) = self.catalog.find(product_id) {
                    self.draft.cart_mut().refresh(product);
                }
                debug!(product_id, %unit, quantity = line.quantity, "Removed from cart");
                Ok(line)
            }
            None => Self::rejected("remove", product_id, CoreError::LineNotFound { product_id }),
        }
    }

    // =========================================================================
    // Barcode
    // =========================================================================

    /// Resolves `code` and adds one of the scanned unit.
    ///
    /// ## Refused Before Adding
    /// - nothing of the product left once the cart is accounted for
    /// - wholesale scan: no packages in stock, or less than one package left
    /// - retail scan: no pieces in stock
    pub async fn scan_barcode<L>(&mut self, backend: &L, code: &str) -> ClientResult<UnitType>
    where
        L: BarcodeLookup + ?Sized,
    {
        let code = code.trim();
        if code.is_empty() {
            return Err(CoreError::BarcodeNotFound(String::new()).into());
        }

        let hit = match backend.lookup_barcode(code).await? {
            Some(hit) => hit,
            None => {
                info!(barcode = %code, "No product for barcode");
                return Err(CoreError::BarcodeNotFound(code.to_string()).into());
            }
        };

        if let Err(err) = self.scan_gate(&hit.product, hit.unit) {
            return Self::rejected("scan", hit.product.id, err);
        }

        let unit = hit.unit;
        self.add_product(hit.product, unit, 1)?;
        Ok(unit)
    }

    fn scan_gate(&self, product: &Product, unit: UnitType) -> Result<(), CoreError> {
        let cart = self.draft.cart();
        let remaining = cart.stock_view(product).remaining();
        if remaining == 0 {
            return Err(CoreError::OutOfStock {
                name: product.name.clone(),
            });
        }

        if product.raw_quantity(unit) + cart.held_quantity(product.id, unit) <= 0 {
            return Err(CoreError::UnitTypeUnavailable {
                name: product.name.clone(),
                unit,
            });
        }

        if unit == UnitType::Wholesale && remaining < product.packaging() {
            return Err(CoreError::IncompletePackage {
                name: product.name.clone(),
                packaging: product.packaging(),
            });
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::BarcodeHit;
    use crate::error::ClientError;
    use crate::testing::{product, FakeBackend};
    use chrono::NaiveDate;
    use kaha_core::TransactionNumber;

    fn session(products: Vec<Product>) -> CartSession {
        let draft = OrderDraft::new(
            TransactionNumber::parse("OR-000001").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        );
        CartSession::new(draft, Catalog::new(products), None)
    }

    fn core_err(result: ClientResult<impl std::fmt::Debug>) -> CoreError {
        match result {
            Err(ClientError::Core(err)) => err,
            other => panic!("expected a cart rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_add_unknown_product_is_rejected() {
        let mut s = session(vec![product(1, 5, 0, 1)]);
        assert_eq!(core_err(s.add_item(9, UnitType::Retail, 1)), CoreError::ProductNotFound(9));
        assert!(s.cart().is_empty());
    }

    #[test]
    fn test_scenario_a_through_session() {
        let mut s = session(vec![product(1, 5, 2, 3)]);
        s.add_item(1, UnitType::Retail, 4).unwrap();
        s.add_item(1, UnitType::Wholesale, 1).unwrap();
        s.increase_item(1, UnitType::Wholesale).unwrap();

        let before = s.cart().clone();
        assert!(matches!(
            core_err(s.increase_item(1, UnitType::Wholesale)),
            CoreError::InsufficientStock { available: 0, .. }
        ));
        assert_eq!(s.cart().lines(), before.lines());
        assert!(s.cart().stock_view(s.catalog().find(1).unwrap()).is_conserved());
    }

    #[test]
    fn test_remove_missing_line() {
        let mut s = session(vec![product(1, 5, 0, 1)]);
        assert_eq!(
            core_err(s.remove_item(1, UnitType::Retail)),
            CoreError::LineNotFound { product_id: 1 }
        );
        s.add_item(1, UnitType::Retail, 2).unwrap();
        assert_eq!(s.remove_item(1, UnitType::Retail).unwrap().quantity, 2);
    }

    #[test]
    fn test_add_product_from_search_joins_catalog() {
        let mut s = session(vec![]);
        s.add_product(product(7, 3, 0, 1), UnitType::Retail, 1).unwrap();
        assert!(s.catalog().find(7).is_some());
        s.increase_item(7, UnitType::Retail).unwrap();
        assert_eq!(s.cart().line(7, UnitType::Retail).unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn test_search_filters_all_products() {
        let mut coke = product(1, 5, 0, 1);
        coke.name = "Coke 1.5L".into();
        let backend = FakeBackend::with_products(vec![coke, product(2, 5, 0, 1)]);
        let s = session(vec![]);

        let hits = s.search(&backend, "  COKE ").await.unwrap();
        assert_eq!(hits.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(s.search(&backend, "").await.unwrap().len(), 2);
        assert!(s.search(&backend, &"x".repeat(101)).await.is_err());
    }

    #[tokio::test]
    async fn test_select_category_refetches() {
        let mut other = product(2, 5, 0, 1);
        other.category_id = Some(2);
        let backend = FakeBackend::with_products(vec![product(1, 5, 0, 1), other]);
        let mut s = session(vec![]);

        s.select_category(&backend, Some(2)).await.unwrap();
        assert_eq!(s.category(), Some(2));
        assert_eq!(s.catalog().len(), 1);
        assert!(s.catalog().find(2).is_some());

        s.select_category(&backend, None).await.unwrap();
        assert_eq!(s.catalog().len(), 2);
    }

    fn scanner(p: Product, unit: UnitType) -> FakeBackend {
        let backend = FakeBackend::default();
        backend
            .state()
            .barcodes
            .insert("123".to_string(), BarcodeHit { product: p, unit });
        backend
    }

    #[tokio::test]
    async fn test_scan_adds_one_of_scanned_unit() {
        let backend = scanner(product(1, 5, 2, 3), UnitType::Wholesale);
        let mut s = session(vec![]);

        assert_eq!(s.scan_barcode(&backend, " 123 ").await.unwrap(), UnitType::Wholesale);
        assert_eq!(s.cart().line(1, UnitType::Wholesale).unwrap().quantity, 1);
        assert!(s.catalog().find(1).is_some());
    }

    #[tokio::test]
    async fn test_scan_unknown_code() {
        let backend = FakeBackend::default();
        let mut s = session(vec![]);
        assert_eq!(
            core_err(s.scan_barcode(&backend, "999").await),
            CoreError::BarcodeNotFound("999".to_string())
        );
    }

    #[tokio::test]
    async fn test_scan_wholesale_without_packages() {
        let backend = scanner(product(1, 9, 0, 3), UnitType::Wholesale);
        let mut s = session(vec![]);
        assert!(matches!(
            core_err(s.scan_barcode(&backend, "123").await),
            CoreError::UnitTypeUnavailable { unit: UnitType::Wholesale, .. }
        ));
        assert!(s.cart().is_empty());
    }

    #[tokio::test]
    async fn test_scan_wholesale_needs_full_package() {
        // 2 pc + 1 case of 3 = 5 pc, 3 pc in the cart: 2 left
        let p = product(1, 2, 1, 3);
        let backend = scanner(p.clone(), UnitType::Wholesale);
        let mut s = session(vec![p]);
        s.add_item(1, UnitType::Retail, 3).unwrap();

        assert_eq!(
            core_err(s.scan_barcode(&backend, "123").await),
            CoreError::IncompletePackage { name: "Product 1".into(), packaging: 3 }
        );
    }

    #[tokio::test]
    async fn test_scan_refused_when_sold_out() {
        let p = product(1, 2, 0, 1);
        let backend = scanner(p.clone(), UnitType::Retail);
        let mut s = session(vec![p]);
        s.add_item(1, UnitType::Retail, 2).unwrap();

        assert!(matches!(
            core_err(s.scan_barcode(&backend, "123").await),
            CoreError::OutOfStock { .. }
        ));
        assert_eq!(s.cart().line(1, UnitType::Retail).unwrap().quantity, 2);
    }
}
