//! # Wire Format
//!
//! JSON shapes spoken by the POS backend, and their conversion to and from
//! the engine's types.
//!
//! ## Boundary Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Backend JSON                          kaha-core                        │
//! │  ─────────────────────────────         ───────────────────────────      │
//! │  112.5 / "112.50" (pesos)        ──►   Money(11250) (centavos)          │
//! │  1 / "1" / true                  ──►   vatable: true                    │
//! │  "3" / 3 / null                  ──►   3 / 3 / default                  │
//! │  one row per (product, unit)     ──►   one Product                      │
//! │  status: 1..5                    ──►   SaleStatus                       │
//! │                                                                         │
//! │  CheckoutPayload                 ──►   checkout / update-sales body     │
//! │  Money                           ──►   pesos as f64, two decimals       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The backend is loose about types (PHP); decoding here is lenient about
//! numbers and flags and strict about identity (ids, transaction numbers,
//! sale status).

use std::collections::HashMap;

use chrono::NaiveDate;
use kaha_core::{
    Category, CheckoutPayload, Customer, CustomerAccount, LineItem, LineSnapshot, Money,
    OriginalOrder, PaymentMethod, PayloadLine, Product, SaleHeader, SaleStatus,
    TransactionNumber, UnitType,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::api::{BarcodeHit, SaleReceipt};
use crate::error::{ClientError, ClientResult};

const DEFAULT_RETAIL_UNIT: &str = "pc";
const DEFAULT_WHOLESALE_UNIT: &str = "pkg";

// =============================================================================
// Lenient Scalars
// =============================================================================

/// Pesos (number or numeric string) to centavos. Anything else is `None`.
pub fn pesos_to_money(value: &Value) -> Option<Money> {
    let pesos = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    pesos.is_finite().then(|| Money::from_cents((pesos * 100.0).round() as i64))
}

/// Centavos to pesos for the request body.
pub fn money_to_pesos(money: Money) -> f64 {
    money.cents() as f64 / 100.0
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().map_or(false, |n| n != 0),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes"),
        _ => false,
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn de_money<'de, D: Deserializer<'de>>(d: D) -> Result<Money, D::Error> {
    Ok(pesos_to_money(&Value::deserialize(d)?).unwrap_or(Money::zero()))
}

fn de_int<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    Ok(integer(&Value::deserialize(d)?).unwrap_or(0))
}

fn de_opt_int<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(integer(&Value::deserialize(d)?))
}

fn de_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(flag(&Value::deserialize(d)?))
}

fn de_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(text(&Value::deserialize(d)?))
}

fn ser_pesos<S: Serializer>(money: &Money, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(money_to_pesos(*money))
}

/// Lists arrive either bare or wrapped in `{ "data": [...] }`.
fn unwrap_list(value: Value) -> ClientResult<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(ClientError::Decode("expected a list or { data: [...] }".into())),
        },
        other => Err(ClientError::Decode(format!("expected a list, got {}", kind_of(&other)))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `message` (or `error`) from a JSON body.
pub fn message_of(value: &Value) -> Option<String> {
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Products
// =============================================================================

/// A product as any of the product endpoints send it.
///
/// `/api/products` sends whole products (`r_price`, `w_price`, `rqty`,
/// `wqty`). `/api/all-products` sends one row per unit type, tagged with
/// `type` and carrying a single `price`/`qty`/`unit_name`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRecord {
    #[serde(deserialize_with = "de_int")]
    pub id: i64,
    #[serde(default, deserialize_with = "de_text")]
    pub barcode: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_int")]
    pub category_id: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_int")]
    pub packaging: Option<i64>,
    #[serde(default = "Money::zero", deserialize_with = "de_money")]
    pub capital: Money,
    #[serde(default, deserialize_with = "de_flag")]
    pub vatable: bool,

    // whole-product fields
    #[serde(default = "Money::zero", deserialize_with = "de_money")]
    pub r_price: Money,
    #[serde(default = "Money::zero", deserialize_with = "de_money")]
    pub w_price: Money,
    #[serde(default, deserialize_with = "de_int")]
    pub rqty: i64,
    #[serde(default, deserialize_with = "de_int")]
    pub wqty: i64,
    #[serde(default, deserialize_with = "de_text")]
    pub retail_unit_name: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    pub wholesale_unit_name: Option<String>,

    // per-unit row fields
    #[serde(default, rename = "type", deserialize_with = "de_text")]
    pub row_type: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    pub unit_name: Option<String>,
    #[serde(default = "Money::zero", deserialize_with = "de_money")]
    pub price: Money,
    #[serde(default, deserialize_with = "de_int")]
    pub qty: i64,
}

impl ProductRecord {
    fn row_unit(&self) -> Option<UnitType> {
        self.row_type.as_deref().and_then(|t| t.parse().ok())
    }

    /// The product without any per-unit row applied.
    fn base(&self) -> Product {
        Product {
            id: self.id,
            name: self.product_name.clone().unwrap_or_default(),
            barcode: self.barcode.clone(),
            category_id: self.category_id,
            retail_unit_name: DEFAULT_RETAIL_UNIT.to_string(),
            wholesale_unit_name: DEFAULT_WHOLESALE_UNIT.to_string(),
            retail_price: Money::zero(),
            wholesale_price: Money::zero(),
            packaging: self.packaging.filter(|p| *p >= 1).unwrap_or(1),
            rqty: 0,
            wqty: 0,
            vatable: self.vatable,
            capital: self.capital,
        }
    }

    fn apply_to(&self, product: &mut Product) {
        match self.row_unit() {
            Some(UnitType::Retail) => {
                product.retail_price = self.price;
                product.rqty = self.qty;
                product.retail_unit_name = self.unit_name_or(DEFAULT_RETAIL_UNIT);
            }
            Some(UnitType::Wholesale) => {
                product.wholesale_price = self.price;
                product.wqty = self.qty;
                product.wholesale_unit_name = self.unit_name_or(DEFAULT_WHOLESALE_UNIT);
            }
            None => {
                product.retail_price = self.r_price;
                product.wholesale_price = self.w_price;
                product.rqty = self.rqty;
                product.wqty = self.wqty;
                if let Some(name) = &self.retail_unit_name {
                    product.retail_unit_name = name.clone();
                }
                if let Some(name) = &self.wholesale_unit_name {
                    product.wholesale_unit_name = name.clone();
                }
            }
        }
    }

    fn unit_name_or(&self, default: &str) -> String {
        self.unit_name.clone().unwrap_or_else(|| default.to_string())
    }

    pub fn into_product(self) -> Product {
        let mut product = self.base();
        self.apply_to(&mut product);
        product
    }
}

/// Folds product records into products, one per id, in first-seen order.
pub fn merge_product_records(records: Vec<ProductRecord>) -> Vec<Product> {
    let mut order: Vec<i64> = Vec::new();
    let mut merged: HashMap<i64, Product> = HashMap::new();

    for record in records {
        let product = merged.entry(record.id).or_insert_with(|| {
            order.push(record.id);
            record.base()
        });
        record.apply_to(product);
    }

    order.into_iter().filter_map(|id| merged.remove(&id)).collect()
}

pub fn decode_products(body: Value) -> ClientResult<Vec<Product>> {
    let records = unwrap_list(body)?
        .into_iter()
        .map(serde_json::from_value::<ProductRecord>)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(merge_product_records(records))
}

// =============================================================================
// Categories, Customers, Numbers, Barcodes
// =============================================================================

#[derive(Debug, Deserialize)]
struct CategoryRecord {
    #[serde(deserialize_with = "de_int")]
    id: i64,
    #[serde(default, deserialize_with = "de_text")]
    name: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    icon: Option<String>,
}

pub fn decode_categories(body: Value) -> ClientResult<Vec<Category>> {
    unwrap_list(body)?
        .into_iter()
        .map(|item| {
            let record: CategoryRecord = serde_json::from_value(item)?;
            Ok(Category {
                id: record.id,
                name: record.name.unwrap_or_default(),
                icon: record.icon,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct CustomerRecord {
    #[serde(deserialize_with = "de_int")]
    id: i64,
    #[serde(default, deserialize_with = "de_text")]
    name: Option<String>,
}

pub fn decode_customers(body: Value) -> ClientResult<Vec<CustomerAccount>> {
    unwrap_list(body)?
        .into_iter()
        .map(|item| {
            let record: CustomerRecord = serde_json::from_value(item)?;
            Ok(CustomerAccount {
                id: record.id,
                name: record.name.unwrap_or_default(),
            })
        })
        .collect()
}

/// `{ "transaction_number": "OR-000124" }`
pub fn decode_transaction_number(body: &Value) -> ClientResult<TransactionNumber> {
    let raw = body
        .get("transaction_number")
        .and_then(text)
        .ok_or_else(|| ClientError::Decode("response has no transaction_number".into()))?;
    TransactionNumber::parse(&raw).map_err(|e| ClientError::Decode(e.to_string()))
}

/// `{ "product": {...}, "type": "retail" | "wholesale" }`, or a body
/// without a product when the code is unknown.
pub fn decode_barcode_hit(body: Value) -> ClientResult<Option<BarcodeHit>> {
    let unit = match body.get("type").and_then(Value::as_str) {
        Some(t) => t.parse::<UnitType>().map_err(|e| ClientError::Decode(e.to_string()))?,
        None => return Ok(None),
    };
    let product = match body.get("product") {
        Some(product @ Value::Object(_)) => product.clone(),
        _ => return Ok(None),
    };

    let record: ProductRecord = serde_json::from_value(product)?;
    Ok(Some(BarcodeHit {
        product: record.into_product(),
        unit,
    }))
}

/// `{ "status": "success", "message": "..." }`; anything else is a failure
/// carrying the backend's message.
pub fn decode_status_response(body: &Value) -> ClientResult<SaleReceipt> {
    let message = message_of(body);
    match body.get("status").and_then(Value::as_str) {
        Some("success") => Ok(SaleReceipt {
            message: message.unwrap_or_default(),
        }),
        _ => Err(ClientError::Server {
            status: None,
            message: message.unwrap_or_else(|| "Failed to save order".to_string()),
        }),
    }
}

// =============================================================================
// Sale Body (checkout / update-sales)
// =============================================================================

#[derive(Debug, Serialize)]
pub struct SaleBody {
    pub transaction_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(serialize_with = "ser_pesos")]
    pub total: Money,
    #[serde(serialize_with = "ser_pesos")]
    pub discount: Money,
    #[serde(serialize_with = "ser_pesos")]
    pub amt_tendered: Money,
    #[serde(serialize_with = "ser_pesos")]
    pub amount_change: Money,
    pub customer: Option<String>,
    pub customer_id: Option<i64>,
    pub table_no: Option<String>,
    #[serde(serialize_with = "ser_pesos")]
    pub vatable_sales: Money,
    #[serde(serialize_with = "ser_pesos")]
    pub vat_amount: Money,
    #[serde(serialize_with = "ser_pesos")]
    pub non_vatable_sales: Money,
    pub payment_method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u8>,
    pub items: Vec<SaleItemBody>,
}

#[derive(Debug, Serialize)]
pub struct SaleItemBody {
    pub product_id: i64,
    #[serde(serialize_with = "ser_pesos")]
    pub capital: Money,
    #[serde(serialize_with = "ser_pesos")]
    pub price: Money,
    pub price_type: UnitType,
    pub quantity: i64,
    #[serde(serialize_with = "ser_pesos")]
    pub subtotal: Money,
    pub vatable: u8,
    pub packaging: i64,
    pub retail_equivalent: i64,
}

impl From<&PayloadLine> for SaleItemBody {
    fn from(line: &PayloadLine) -> Self {
        SaleItemBody {
            product_id: line.product_id,
            capital: line.capital,
            price: line.price,
            price_type: line.unit_type,
            quantity: line.quantity,
            subtotal: line.subtotal,
            vatable: u8::from(line.vatable),
            packaging: line.packaging,
            retail_equivalent: line.retail_equivalent,
        }
    }
}

impl SaleBody {
    fn from_payload(payload: &CheckoutPayload, date: Option<NaiveDate>) -> Self {
        SaleBody {
            transaction_number: payload.transaction_number.to_string(),
            date,
            total: payload.breakdown.total,
            discount: payload.discount,
            amt_tendered: payload.amount_tendered,
            amount_change: payload.change,
            customer: payload.customer.clone(),
            customer_id: payload.customer_id,
            table_no: payload.table_no.clone(),
            vatable_sales: payload.breakdown.vatable_base,
            vat_amount: payload.breakdown.vat_amount,
            non_vatable_sales: payload.breakdown.non_vatable_base,
            payment_method: payload.payment_method.as_str(),
            status: payload.status.map(|s| s.code()),
            items: payload.lines.iter().map(SaleItemBody::from).collect(),
        }
    }

    /// Body for `POST /api/checkout`.
    pub fn checkout(payload: &CheckoutPayload) -> Self {
        Self::from_payload(payload, Some(payload.date))
    }

    /// Body for `PUT /api/update-sales/{id}`. The stored date stays.
    pub fn update(payload: &CheckoutPayload) -> Self {
        Self::from_payload(payload, None)
    }
}

// =============================================================================
// Edit Sale (GET /api/edit-sales/{id})
// =============================================================================

#[derive(Debug, Deserialize)]
struct EditSaleEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    data: Option<EditSaleData>,
}

#[derive(Debug, Deserialize)]
struct EditSaleData {
    sale: SaleRecord,
    #[serde(default)]
    sales_orders: Vec<SalesOrderRecord>,
}

#[derive(Debug, Deserialize)]
struct SaleRecord {
    #[serde(deserialize_with = "de_text")]
    transaction_number: Option<String>,
    #[serde(default = "Money::zero", deserialize_with = "de_money")]
    discount: Money,
    #[serde(default = "Money::zero", deserialize_with = "de_money")]
    amt_tendered: Money,
    #[serde(default, deserialize_with = "de_text")]
    customer: Option<String>,
    #[serde(default, deserialize_with = "de_opt_int")]
    customer_id: Option<i64>,
    #[serde(default, deserialize_with = "de_text")]
    table_no: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    date: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    payment_method: Option<String>,
    #[serde(default, deserialize_with = "de_opt_int")]
    status: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SalesOrderRecord {
    #[serde(deserialize_with = "de_int")]
    product_id: i64,
    #[serde(default = "Money::zero", deserialize_with = "de_money")]
    capital: Money,
    #[serde(default = "Money::zero", deserialize_with = "de_money")]
    price: Money,
    #[serde(deserialize_with = "de_int")]
    quantity: i64,
    #[serde(deserialize_with = "de_text")]
    price_type: Option<String>,
    #[serde(default, deserialize_with = "de_flag")]
    vatable: bool,
    #[serde(default, deserialize_with = "de_opt_int")]
    packaging: Option<i64>,
    #[serde(default)]
    product: Option<OrderedProductRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct OrderedProductRecord {
    #[serde(default, deserialize_with = "de_text")]
    product_name: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    retail_unit_name: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    wholesale_unit_name: Option<String>,
    #[serde(default, deserialize_with = "de_int")]
    rqty: i64,
    #[serde(default, deserialize_with = "de_int")]
    wqty: i64,
}

/// Accepts `2024-03-15`, `2024-03-15 10:22:01` and RFC 3339 timestamps.
fn parse_sale_date(raw: &str) -> ClientResult<NaiveDate> {
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .ok_or_else(|| ClientError::Decode(format!("unreadable sale date '{}'", raw)))
}

impl SaleRecord {
    fn into_header(self, sale_id: i64) -> ClientResult<SaleHeader> {
        let number = self
            .transaction_number
            .ok_or_else(|| ClientError::Decode("sale has no transaction_number".into()))?;
        let transaction_number =
            TransactionNumber::parse(&number).map_err(|e| ClientError::Decode(e.to_string()))?;

        let status = self
            .status
            .and_then(|code| u8::try_from(code).ok())
            .and_then(SaleStatus::from_code)
            .ok_or_else(|| ClientError::Decode(format!("sale {} has no valid status", sale_id)))?;

        let date = match self.date.as_deref() {
            Some(raw) => parse_sale_date(raw)?,
            None => return Err(ClientError::Decode(format!("sale {} has no date", sale_id))),
        };

        let customer = match self.customer_id {
            Some(id) => Customer::Account(CustomerAccount {
                id,
                name: self.customer.unwrap_or_default(),
            }),
            None => Customer::from_name(self.customer.as_deref().unwrap_or_default()),
        };

        let payment_method = match self.payment_method.as_deref() {
            Some(raw) => raw.parse::<PaymentMethod>().map_err(|e| ClientError::Decode(e.to_string()))?,
            None => PaymentMethod::default(),
        };

        Ok(SaleHeader {
            sale_id,
            status,
            transaction_number,
            date,
            customer,
            table_no: self.table_no,
            discount: self.discount,
            amount_tendered: self.amt_tendered,
            payment_method,
        })
    }
}

impl SalesOrderRecord {
    fn into_line(self) -> ClientResult<LineItem> {
        let unit = self
            .price_type
            .as_deref()
            .ok_or_else(|| ClientError::Decode(format!("order line for product {} has no price_type", self.product_id)))?
            .parse::<UnitType>()
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        let product = self.product.unwrap_or_default();
        let raw_quantity = match unit {
            UnitType::Retail => product.rqty,
            UnitType::Wholesale => product.wqty,
        };

        let snapshot = LineSnapshot {
            name: product.product_name.unwrap_or_default(),
            retail_unit_name: product
                .retail_unit_name
                .unwrap_or_else(|| DEFAULT_RETAIL_UNIT.to_string()),
            wholesale_unit_name: product
                .wholesale_unit_name
                .unwrap_or_else(|| DEFAULT_WHOLESALE_UNIT.to_string()),
            unit_price: self.price,
            vatable: self.vatable,
            packaging: self.packaging.filter(|p| *p >= 1).unwrap_or(1),
            capital: self.capital,
        };

        Ok(LineItem::hydrated(self.product_id, unit, self.quantity, snapshot, raw_quantity))
    }
}

pub fn decode_edit_sale(sale_id: i64, body: Value) -> ClientResult<OriginalOrder> {
    let envelope: EditSaleEnvelope = serde_json::from_value(body)?;

    let data = match (envelope.status.as_deref(), envelope.data) {
        (Some("success"), Some(data)) => data,
        _ => {
            return Err(ClientError::Server {
                status: None,
                message: envelope
                    .message
                    .unwrap_or_else(|| "Failed to load order data".to_string()),
            })
        }
    };

    let header = data.sale.into_header(sale_id)?;
    let lines = data
        .sales_orders
        .into_iter()
        .map(SalesOrderRecord::into_line)
        .collect::<ClientResult<Vec<_>>>()?;

    Ok(OriginalOrder::new(header, lines))
}

// =============================================================================
// Unit Tests
// =============================================================================
