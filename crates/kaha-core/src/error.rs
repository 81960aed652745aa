//! # Error Types
//!
//! Domain-specific error types for kaha-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kaha-core errors (this file)                                          │
//! │  ├── CoreError        - Rejected cart actions & submissions            │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  kaha-client errors (separate crate)                                   │
//! │  └── ClientError      - Transport / server failures, wraps CoreError   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → cashier message     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Every variant is recoverable: a rejected action never mutates state
//! 2. `Display` output is the message shown to the cashier
//! 3. Stock shortfalls carry the full structured report, not just text

use thiserror::Error;

use crate::checkout::ShortfallReport;
use crate::money::Money;
use crate::types::{PaymentMethod, SaleStatus, UnitType};

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the cart and checkout engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Product id is not in the loaded catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Quantity was zero or negative.
    #[error("Quantity must be at least 1, got {quantity}")]
    InvalidQuantity { quantity: i64 },

    /// Item quantity exceeds the per-line cap.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Cart has reached the maximum number of lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Nothing of this product is left once the cart is accounted for.
    #[error("No more {name} available!")]
    OutOfStock { name: String },

    /// The requested quantity does not fit in the remaining stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Add 3 cases (packaging 12)
    ///      │
    ///      ▼
    /// remaining retail-equivalent = 30 → max addable = 2 cases
    ///      │
    ///      ▼
    /// InsufficientStock { available: 2, unit: Wholesale }
    ///      │
    ///      ▼
    /// "Only 2 wholesale packages of Coke available!"
    /// ```
    #[error("Only {available} {} of {name} available!", unit_label(.unit))]
    InsufficientStock {
        name: String,
        available: i64,
        unit: UnitType,
    },

    /// A first line of this unit type cannot be opened: the catalog holds
    /// none of it (e.g. no whole packages even though loose pieces exist).
    #[error("No {} of {name} available!", unit_label(.unit))]
    UnitTypeUnavailable { name: String, unit: UnitType },

    /// Remaining stock is less than one full package.
    #[error("Not enough stock for a full wholesale package of {name} (needs {packaging} retail units)")]
    IncompletePackage { name: String, packaging: i64 },

    /// The line already sits at its flagged stock limit.
    #[error("Cannot add more {name} - only {available} available")]
    StockLimitReached { name: String, available: i64 },

    /// No cart line matches the product (and unit type).
    #[error("Product {product_id} is not in the cart")]
    LineNotFound { product_id: i64 },

    /// Barcode did not resolve to any product.
    #[error("No product found for barcode {0}")]
    BarcodeNotFound(String),

    /// Submission attempted with no lines.
    #[error("Cart is empty: add items before checkout")]
    EmptyCart,

    /// Tender is zero or below the amount due.
    #[error("Insufficient tender: amount tendered ({tendered}) is less than the total due ({due})")]
    InsufficientTender { tendered: Money, due: Money },

    /// Point-in-time stock re-check failed for one or more lines.
    #[error("Insufficient stock:\n{0}")]
    StockShortfall(ShortfallReport),

    /// Credit payment without a selected customer.
    #[error("Please select a customer for credit payment")]
    CustomerRequired,

    /// Credit payment while no customer accounts exist.
    #[error("No customers available for credit payment")]
    NoCustomersAvailable,

    /// Payment method is not offered in the current mode.
    #[error("{method} payment is not available here")]
    PaymentMethodNotAllowed { method: PaymentMethod },

    /// The persisted sale can no longer be changed.
    #[error("Sale {transaction_number} is {status} and cannot be edited")]
    OrderNotEditable {
        transaction_number: String,
        status: SaleStatus,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

fn unit_label(unit: &UnitType) -> &'static str {
    match unit {
        UnitType::Retail => "retail units",
        UnitType::Wholesale => "wholesale packages",
    }
}

impl CoreError {
    /// True for the stock family of rejections (live or point-in-time).
    pub fn is_stock_rejection(&self) -> bool {
        matches!(
            self,
            CoreError::OutOfStock { .. }
                | CoreError::InsufficientStock { .. }
                | CoreError::UnitTypeUnavailable { .. }
                | CoreError::IncompletePackage { .. }
                | CoreError::StockLimitReached { .. }
                | CoreError::StockShortfall(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation of field values before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g. malformed transaction number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            name: "Coke Mismo".to_string(),
            available: 2,
            unit: UnitType::Wholesale,
        };
        assert_eq!(
            err.to_string(),
            "Only 2 wholesale packages of Coke Mismo available!"
        );
    }

    #[test]
    fn test_unit_type_unavailable_message() {
        let err = CoreError::UnitTypeUnavailable {
            name: "Lucky Me".to_string(),
            unit: UnitType::Retail,
        };
        assert_eq!(err.to_string(), "No retail units of Lucky Me available!");
    }

    #[test]
    fn test_insufficient_tender_message() {
        let err = CoreError::InsufficientTender {
            tendered: Money::zero(),
            due: Money::from_cents(11200),
        };
        assert!(err.to_string().starts_with("Insufficient tender"));
        assert!(err.to_string().contains("₱112.00"));
    }

    #[test]
    fn test_stock_rejection_family() {
        assert!(CoreError::OutOfStock {
            name: "x".to_string()
        }
        .is_stock_rejection());
        assert!(!CoreError::EmptyCart.is_stock_rejection());
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "customer".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
