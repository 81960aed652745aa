//! # Catalog
//!
//! The in-memory copy of the backend's product list.
//!
//! The catalog is replaced wholesale on every fetch and only ever read by
//! the cart; stock figures in it are a point-in-time view. Barcode scans may
//! upsert a single freshly-resolved product between fetches.

use serde::{Deserialize, Serialize};

use crate::types::Product;

/// Products as last fetched, in backend order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Catalog { products }
    }

    pub fn find(&self, product_id: i64) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Swaps in a freshly fetched product list.
    pub fn replace(&mut self, products: Vec<Product>) {
        self.products = products;
    }

    /// Inserts `product`, or overwrites the entry with the same id.
    pub fn upsert(&mut self, product: Product) {
        match self.products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => self.products.push(product),
        }
    }

    /// Case-insensitive name/barcode filter for the product search modal.
    pub fn search(&self, term: &str) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.matches_search(term))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::product;

    #[test]
    fn test_find_and_upsert() {
        let mut catalog = Catalog::new(vec![product(1, 5, 0, 1), product(2, 3, 0, 1)]);
        assert_eq!(catalog.find(2).map(|p| p.rqty), Some(3));
        assert!(catalog.find(9).is_none());

        catalog.upsert(product(2, 0, 0, 1));
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.find(2).map(|p| p.rqty), Some(0));

        catalog.upsert(product(3, 7, 0, 1));
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_search_filters_by_name() {
        let mut a = product(1, 5, 0, 1);
        a.name = "Lucky Me Pancit Canton".to_string();
        let mut b = product(2, 5, 0, 1);
        b.name = "Coke Mismo".to_string();
        b.barcode = None;
        let catalog = Catalog::new(vec![a, b]);

        let hits = catalog.search("pancit");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
        assert_eq!(catalog.search("").len(), 2);
    }
}
