//! # Domain Types
//!
//! Core domain types used throughout Kaha POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    UnitType     │   │  PaymentMethod  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  Retail         │   │  Cash           │       │
//! │  │  retail price   │   │  Wholesale      │   │  GCash          │       │
//! │  │  package price  │   └─────────────────┘   │  Bank Transfer  │       │
//! │  │  packaging      │                         │  Credit (edit)  │       │
//! │  │  rqty / wqty    │   ┌─────────────────┐   └─────────────────┘       │
//! │  │  vatable        │   │   SaleStatus    │                              │
//! │  └─────────────────┘   │  ─────────────  │   ┌─────────────────┐       │
//! │                        │  1 Paid         │   │    TaxRate      │       │
//! │                        │  2 Unpaid       │   │  ─────────────  │       │
//! │                        │  3 Cancelled    │   │  bps (u32)      │       │
//! │                        │  4 Returned     │   │  1200 = 12%     │       │
//! │                        │  5 Part. Ret.   │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Catalog vs. Snapshot
//! A [`Product`] is the *live* catalog entry and is replaced wholesale every
//! time the catalog is fetched. Cart lines never hold a `Product`; they carry
//! their own frozen [`crate::cart::LineSnapshot`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1200 bps = 12% (Philippine VAT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Unit Type
// =============================================================================

/// The two ways a product can be sold.
///
/// A wholesale unit is one package of `packaging` retail units. Stock math
/// always converts to retail units first (see [`crate::stock`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    /// Individual pieces.
    Retail,
    /// Whole packages.
    Wholesale,
}

impl UnitType {
    /// Wire/display label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            UnitType::Retail => "retail",
            UnitType::Wholesale => "wholesale",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "retail" => Ok(UnitType::Retail),
            "wholesale" => Ok(UnitType::Wholesale),
            _ => Err(ValidationError::NotAllowed {
                field: "unit type".to_string(),
                allowed: vec!["retail".to_string(), "wholesale".to_string()],
            }),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog entry as last fetched from the backend.
///
/// Read-only to the engine. Stock figures are a point-in-time view; the
/// backend may have moved on since.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Display name shown to the cashier and on the receipt.
    pub name: String,

    pub barcode: Option<String>,

    pub category_id: Option<i64>,

    /// e.g. "pc", "bottle".
    pub retail_unit_name: String,

    /// e.g. "box", "case".
    pub wholesale_unit_name: String,

    /// Price of one retail unit (VAT-inclusive when `vatable`).
    pub retail_price: Money,

    /// Price of one wholesale package.
    pub wholesale_price: Money,

    /// Retail units per wholesale package. Values below 1 are read as 1.
    pub packaging: i64,

    /// Retail units in stock.
    pub rqty: i64,

    /// Wholesale packages in stock.
    pub wqty: i64,

    pub vatable: bool,

    /// Cost basis, passed through to the sale payload untouched.
    pub capital: Money,
}

impl Product {
    /// Packaging ratio, never below 1.
    #[inline]
    pub fn packaging(&self) -> i64 {
        self.packaging.max(1)
    }

    /// Unit price for the given unit type.
    pub fn price(&self, unit: UnitType) -> Money {
        match unit {
            UnitType::Retail => self.retail_price,
            UnitType::Wholesale => self.wholesale_price,
        }
    }

    /// Unit name for the given unit type.
    pub fn unit_name(&self, unit: UnitType) -> &str {
        match unit {
            UnitType::Retail => &self.retail_unit_name,
            UnitType::Wholesale => &self.wholesale_unit_name,
        }
    }

    /// Raw catalog count for one unit type (`rqty` or `wqty`), not converted.
    pub fn raw_quantity(&self, unit: UnitType) -> i64 {
        match unit {
            UnitType::Retail => self.rqty,
            UnitType::Wholesale => self.wqty,
        }
    }

    /// Converts a quantity of `unit` into retail units.
    pub fn to_retail_equivalent(&self, unit: UnitType, quantity: i64) -> i64 {
        crate::stock::retail_equivalent(unit, quantity, self.packaging())
    }

    /// `rqty + wqty × packaging`.
    pub fn total_retail_equivalent(&self) -> i64 {
        self.rqty + self.wqty * self.packaging()
    }

    /// Which unit types have a price set.
    pub fn price_availability(&self) -> PriceAvailability {
        match (
            self.retail_price.is_positive(),
            self.wholesale_price.is_positive(),
        ) {
            (true, true) => PriceAvailability::Both,
            (true, false) => PriceAvailability::RetailOnly,
            (false, true) => PriceAvailability::WholesaleOnly,
            (false, false) => PriceAvailability::Unpriced,
        }
    }

    /// Case-insensitive match on name or barcode, used by product search.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        self.name.to_lowercase().contains(&term)
            || self
                .barcode
                .as_deref()
                .is_some_and(|b| b.to_lowercase().contains(&term))
    }
}

/// Which unit types a product can be sold in, by which prices are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PriceAvailability {
    Both,
    RetailOnly,
    WholesaleOnly,
    Unpriced,
}

// =============================================================================
// Category & Customer
// =============================================================================

/// A product category used to filter the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
}

/// A customer account that can carry credit (utang).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerAccount {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PaymentMethod {
    #[default]
    Cash,
    GCash,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    /// Charged to a customer account. Only offered when editing a sale.
    Credit,
}

impl PaymentMethod {
    /// Wire/display label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::GCash => "GCash",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::Credit => "Credit",
        }
    }

    /// Whether this method can be selected in the given mode.
    pub fn allowed_in(&self, mode: OrderMode) -> bool {
        match self {
            PaymentMethod::Credit => mode == OrderMode::Edit,
            PaymentMethod::Cash | PaymentMethod::GCash | PaymentMethod::BankTransfer => true,
        }
    }

    /// Credit sales take no tender and give no change.
    pub fn takes_tender(&self) -> bool {
        !matches!(self, PaymentMethod::Credit)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "gcash" => Ok(PaymentMethod::GCash),
            "bank transfer" | "bank_transfer" | "bank" => Ok(PaymentMethod::BankTransfer),
            "credit" => Ok(PaymentMethod::Credit),
            _ => Err(ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: ["Cash", "GCash", "Bank Transfer", "Credit"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Order Mode
// =============================================================================

/// Whether the cashier is ringing up a new sale or revising a persisted one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderMode {
    #[default]
    New,
    Edit,
}

// =============================================================================
// Sale Status
// =============================================================================

/// Status of a persisted sale, as numeric codes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SaleStatus {
    Paid,
    Unpaid,
    Cancelled,
    Returned,
    PartiallyReturned,
}

impl SaleStatus {
    pub const fn code(&self) -> u8 {
        match self {
            SaleStatus::Paid => 1,
            SaleStatus::Unpaid => 2,
            SaleStatus::Cancelled => 3,
            SaleStatus::Returned => 4,
            SaleStatus::PartiallyReturned => 5,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(SaleStatus::Paid),
            2 => Some(SaleStatus::Unpaid),
            3 => Some(SaleStatus::Cancelled),
            4 => Some(SaleStatus::Returned),
            5 => Some(SaleStatus::PartiallyReturned),
            _ => None,
        }
    }

    /// Cancelled and fully returned sales are closed for editing.
    pub const fn is_editable(&self) -> bool {
        match self {
            SaleStatus::Paid | SaleStatus::Unpaid | SaleStatus::PartiallyReturned => true,
            SaleStatus::Cancelled | SaleStatus::Returned => false,
        }
    }
}

impl TryFrom<u8> for SaleStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        SaleStatus::from_code(code).ok_or_else(|| format!("unknown sale status code {}", code))
    }
}

impl From<SaleStatus> for u8 {
    fn from(status: SaleStatus) -> u8 {
        status.code()
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SaleStatus::Paid => "Paid",
            SaleStatus::Unpaid => "Unpaid",
            SaleStatus::Cancelled => "Cancelled",
            SaleStatus::Returned => "Returned",
            SaleStatus::PartiallyReturned => "Partially Returned",
        };
        f.write_str(label)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(rqty: i64, wqty: i64, packaging: i64) -> Product {
        Product {
            id: 1,
            name: "Coke Mismo".to_string(),
            barcode: Some("4800888".to_string()),
            category_id: Some(2),
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

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(1200);
        assert_eq!(rate.bps(), 1200);
        assert!((rate.percentage() - 12.0).abs() < 0.001);
    }

    #[test]
    fn test_packaging_floor_is_one() {
        assert_eq!(product(1, 1, 0).packaging(), 1);
        assert_eq!(product(1, 1, -4).packaging(), 1);
        assert_eq!(product(1, 1, 12).packaging(), 12);
    }

    #[test]
    fn test_total_retail_equivalent() {
        assert_eq!(product(5, 2, 3).total_retail_equivalent(), 11);
        assert_eq!(product(5, 2, 0).total_retail_equivalent(), 7);
    }

    #[test]
    fn test_price_availability() {
        let mut p = product(1, 1, 12);
        assert_eq!(p.price_availability(), PriceAvailability::Both);
        p.wholesale_price = Money::zero();
        assert_eq!(p.price_availability(), PriceAvailability::RetailOnly);
        p.retail_price = Money::zero();
        assert_eq!(p.price_availability(), PriceAvailability::Unpriced);
    }

    #[test]
    fn test_matches_search() {
        let p = product(1, 1, 12);
        assert!(p.matches_search("coke"));
        assert!(p.matches_search("  MISMO "));
        assert!(p.matches_search("4800"));
        assert!(p.matches_search(""));
        assert!(!p.matches_search("sprite"));
    }

    #[test]
    fn test_unit_type_parse() {
        assert_eq!("Retail".parse::<UnitType>().unwrap(), UnitType::Retail);
        assert_eq!("wholesale".parse::<UnitType>().unwrap(), UnitType::Wholesale);
        assert!("both".parse::<UnitType>().is_err());
    }

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).unwrap(),
            "\"Bank Transfer\""
        );
        assert_eq!(
            serde_json::from_str::<PaymentMethod>("\"GCash\"").unwrap(),
            PaymentMethod::GCash
        );
    }

    #[test]
    fn test_credit_only_in_edit_mode() {
        assert!(!PaymentMethod::Credit.allowed_in(OrderMode::New));
        assert!(PaymentMethod::Credit.allowed_in(OrderMode::Edit));
        assert!(PaymentMethod::Cash.allowed_in(OrderMode::New));
    }

    #[test]
    fn test_sale_status_codes() {
        assert_eq!(serde_json::to_string(&SaleStatus::Unpaid).unwrap(), "2");
        assert_eq!(
            serde_json::from_str::<SaleStatus>("5").unwrap(),
            SaleStatus::PartiallyReturned
        );
        assert!(serde_json::from_str::<SaleStatus>("9").is_err());
    }

    #[test]
    fn test_sale_status_editability() {
        assert!(SaleStatus::Paid.is_editable());
        assert!(SaleStatus::Unpaid.is_editable());
        assert!(!SaleStatus::Cancelled.is_editable());
        assert!(!SaleStatus::Returned.is_editable());
    }
}
