//! # HTTP Backend
//!
//! [`PosBackend`](crate::api::PosBackend) over the POS backend's JSON API.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET  /api/products[/{category}]      grid products                    │
//! │  GET  /api/all-products               per-unit rows (search modal)     │
//! │  GET  /api/categories                 category tabs                    │
//! │  GET  /api/customers                  credit customer accounts         │
//! │  GET  /api/next-transaction-number    { transaction_number }           │
//! │  GET  /api/products-by-barcode/{code} { product, type }                │
//! │  POST /api/checkout                   new sale, decrements stock       │
//! │  GET  /api/edit-sales/{id}            { sale, sales_orders }           │
//! │  PUT  /api/update-sales/{id}          replace sale in place            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each call is sent once with the configured timeout. Failures keep the
//! backend's own message where it sent one.

use async_trait::async_trait;
use kaha_core::{Category, CheckoutPayload, CustomerAccount, OriginalOrder, Product, TransactionNumber};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::{
    BarcodeHit, BarcodeLookup, CatalogService, CustomerDirectory, SaleReceipt, SalesGateway,
    TransactionNumberIssuer,
};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::wire::{self, SaleBody};

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Fallback text for a failed status when the body carries no message.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        401 | 419 => "Session expired. Please sign in again".to_string(),
        403 => "This terminal is not allowed to do that".to_string(),
        404 => "POS server endpoint not found".to_string(),
        422 => "The POS server rejected the request".to_string(),
        s if s >= 500 => format!("POS server error (HTTP {s})"),
        s => format!("Unexpected response from POS server (HTTP {s})"),
    }
}

/// Backend message from a failed response body, or a status-based fallback.
fn failure_message(status: StatusCode, body_text: &str) -> String {
    serde_json::from_str::<Value>(body_text)
        .ok()
        .as_ref()
        .and_then(wire::message_of)
        .unwrap_or_else(|| status_error(status))
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Talks to one POS backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(HttpBackend {
            client,
            base: Self::normalize_base(config.base_url())?,
        })
    }

    /// Parses the base URL, dropping a trailing `/api`, so paths can always
    /// be written from `/api/...`. The result always ends in `/`.
    fn normalize_base(raw: &str) -> ClientResult<Url> {
        let mut trimmed = raw.trim().trim_end_matches('/');
        if let Some(stripped) = trimmed.strip_suffix("/api") {
            trimmed = stripped.trim_end_matches('/');
        }
        Ok(Url::parse(&format!("{}/", trimmed))?)
    }

    /// `path` includes the leading slash, e.g. `/api/products`.
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// Endpoint with one trailing path segment, percent-encoded.
    fn endpoint_with(&self, path: &str, segment: &str) -> ClientResult<Url> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidConfig(format!("cannot extend URL {}", self.base)))?
            .push(segment);
        Ok(url)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> ClientResult<(StatusCode, Value)> {
        debug!(%method, %url, "Calling POS backend");

        let mut request = self.client.request(method, url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(%url, error = %e, "POS backend unreachable");
            ClientError::Http(e)
        })?;

        let status = response.status();
        let body_text = response.text().await?;

        if !status.is_success() {
            let message = failure_message(status, &body_text);
            warn!(%url, status = status.as_u16(), message = %message, "POS backend refused request");
            return Err(ClientError::Server {
                status: Some(status.as_u16()),
                message,
            });
        }

        if body_text.trim().is_empty() {
            return Ok((status, Value::Null));
        }
        let value = serde_json::from_str(&body_text)
            .map_err(|e| ClientError::Decode(format!("invalid JSON from {}: {}", url, e)))?;
        Ok((status, value))
    }

    async fn get(&self, url: Url) -> ClientResult<Value> {
        self.send::<Value>(Method::GET, url, None).await.map(|(_, body)| body)
    }
}

// ---------------------------------------------------------------------------
// Collaborator impls
// ---------------------------------------------------------------------------

#[async_trait]
impl CatalogService for HttpBackend {
    async fn fetch_products(&self, category: Option<i64>) -> ClientResult<Vec<Product>> {
        let url = match category {
            Some(id) => self.endpoint_with("/api/products", &id.to_string())?,
            None => self.endpoint("/api/products")?,
        };
        let products = wire::decode_products(self.get(url).await?)?;
        debug!(count = products.len(), ?category, "Fetched products");
        Ok(products)
    }

    async fn fetch_all_products(&self) -> ClientResult<Vec<Product>> {
        let url = self.endpoint("/api/all-products")?;
        wire::decode_products(self.get(url).await?)
    }

    async fn fetch_categories(&self) -> ClientResult<Vec<Category>> {
        let url = self.endpoint("/api/categories")?;
        wire::decode_categories(self.get(url).await?)
    }
}

#[async_trait]
impl CustomerDirectory for HttpBackend {
    async fn fetch_customers(&self) -> ClientResult<Vec<CustomerAccount>> {
        let url = self.endpoint("/api/customers")?;
        wire::decode_customers(self.get(url).await?)
    }
}

#[async_trait]
impl TransactionNumberIssuer for HttpBackend {
    async fn next_transaction_number(&self) -> ClientResult<TransactionNumber> {
        let url = self.endpoint("/api/next-transaction-number")?;
        wire::decode_transaction_number(&self.get(url).await?)
    }
}

#[async_trait]
impl BarcodeLookup for HttpBackend {
    async fn lookup_barcode(&self, code: &str) -> ClientResult<Option<BarcodeHit>> {
        let url = self.endpoint_with("/api/products-by-barcode", code.trim())?;
        match self.get(url).await {
            Ok(body) => wire::decode_barcode_hit(body),
            Err(ClientError::Server { status: Some(404), .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl SalesGateway for HttpBackend {
    async fn submit_sale(&self, payload: &CheckoutPayload) -> ClientResult<SaleReceipt> {
        let url = self.endpoint("/api/checkout")?;
        let body = SaleBody::checkout(payload);
        let (_, response) = self.send(Method::POST, url, Some(&body)).await?;
        let receipt = wire::decode_status_response(&response)?;
        info!(transaction = %payload.transaction_number, "Sale saved");
        Ok(receipt)
    }

    async fn load_sale(&self, sale_id: i64) -> ClientResult<OriginalOrder> {
        let url = self.endpoint_with("/api/edit-sales", &sale_id.to_string())?;
        wire::decode_edit_sale(sale_id, self.get(url).await?)
    }

    async fn update_sale(&self, sale_id: i64, payload: &CheckoutPayload) -> ClientResult<SaleReceipt> {
        let url = self.endpoint_with("/api/update-sales", &sale_id.to_string())?;
        let body = SaleBody::update(payload);
        let (_, response) = self.send(Method::PUT, url, Some(&body)).await?;
        let receipt = wire::decode_status_response(&response)?;
        info!(sale_id, transaction = %payload.transaction_number, "Sale updated");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base_url: &str) -> HttpBackend {
        let mut config = ClientConfig::default();
        config.api.base_url = base_url.to_string();
        HttpBackend::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_construction() {
        let b = backend("http://10.0.0.5:8000");
        assert_eq!(
            b.endpoint("/api/products").unwrap().as_str(),
            "http://10.0.0.5:8000/api/products"
        );
        assert_eq!(
            b.endpoint_with("/api/products", "3").unwrap().as_str(),
            "http://10.0.0.5:8000/api/products/3"
        );
    }

    #[test]
    fn test_base_url_normalization() {
        for raw in ["http://pos.local/", "http://pos.local/api", "http://pos.local/api/ "] {
            assert_eq!(
                backend(raw).endpoint("/api/checkout").unwrap().as_str(),
                "http://pos.local/api/checkout"
            );
        }
    }

    #[test]
    fn test_base_url_with_path_prefix() {
        assert_eq!(
            backend("https://shop.example.ph/pos").endpoint("/api/customers").unwrap().as_str(),
            "https://shop.example.ph/pos/api/customers"
        );
    }

    #[test]
    fn test_barcode_segment_is_encoded() {
        let b = backend("http://pos.local");
        assert_eq!(
            b.endpoint_with("/api/products-by-barcode", "48 00/1").unwrap().as_str(),
            "http://pos.local/api/products-by-barcode/48%2000%2F1"
        );
    }

    #[test]
    fn test_failure_message_prefers_body() {
        let status = StatusCode::UNPROCESSABLE_ENTITY;
        assert_eq!(
            failure_message(status, r#"{"message":"Insufficient stock for Coke"}"#),
            "Insufficient stock for Coke"
        );
        assert_eq!(failure_message(status, r#"{"error":"Bad payload"}"#), "Bad payload");
        assert_eq!(failure_message(status, "<html>oops</html>"), status_error(status));
        assert_eq!(
            failure_message(StatusCode::BAD_GATEWAY, ""),
            "POS server error (HTTP 502)"
        );
    }
}
