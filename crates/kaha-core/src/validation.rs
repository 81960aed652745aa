//! # Validation Module
//!
//! Field-level input checks for the order header.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Cashier frontend                                             │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate feedback                                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: OrderDraft setters (Rust)                                    │
//! │  └── THIS MODULE: field rules (discount, tender, names)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Cart / checkout gates                                        │
//! │  └── Stock, tender sufficiency, editability                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Backend                                                       │
//! │  └── Authoritative stock and persistence checks                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kaha_core::money::Money;
//! use kaha_core::validation::{validate_discount, validate_transaction_number};
//!
//! validate_transaction_number("OR-000123").unwrap();
//! validate_discount(Money::from_cents(500), Money::from_cents(11200)).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a transaction number.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - No whitespace
///
/// ## Example
/// ```rust
/// use kaha_core::validation::validate_transaction_number;
///
/// assert!(validate_transaction_number("OR-000123").is_ok());
/// assert!(validate_transaction_number("").is_err());
/// assert!(validate_transaction_number("OR 1").is_err());
/// ```
pub fn validate_transaction_number(number: &str) -> ValidationResult<()> {
    let number = number.trim();

    if number.is_empty() {
        return Err(ValidationError::Required {
            field: "transaction number".to_string(),
        });
    }

    if number.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "transaction number".to_string(),
            max: 50,
        });
    }

    if number.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "transaction number".to_string(),
            reason: "must not contain spaces".to_string(),
        });
    }

    Ok(())
}

/// Validates a free-text customer name. Empty is allowed (walk-in).
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    if name.trim().len() > 200 {
        return Err(ValidationError::TooLong {
            field: "customer name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a table number. Empty is allowed (no table).
pub fn validate_table_no(table_no: &str) -> ValidationResult<()> {
    if table_no.trim().len() > 20 {
        return Err(ValidationError::TooLong {
            field: "table number".to_string(),
            max: 20,
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns the whole catalog)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Money Validators
// =============================================================================

/// Validates a discount against the cart subtotal.
///
/// ## Rules
/// - Must be non-negative
/// - Must not exceed the subtotal
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Tender Panel: Discount                                                 │
/// │                                                                         │
/// │  Cashier enters discount: ₱20.00 on a ₱112.00 cart                     │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_discount(2000, 11200) ← THIS FUNCTION                        │
/// │       │                                                                 │
/// │       ├── < 0? → Error: "discount cannot be negative"                  │
/// │       │                                                                 │
/// │       ├── > subtotal? → Error: "discount must be between 0 and …"      │
/// │       │                                                                 │
/// │       └── OK → amount due = ₱92.00                                     │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_discount(discount: Money, subtotal: Money) -> ValidationResult<()> {
    if discount.is_negative() {
        return Err(ValidationError::Negative {
            field: "discount".to_string(),
        });
    }

    if discount > subtotal {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: subtotal.cents(),
        });
    }

    Ok(())
}

/// Validates an amount tendered. Zero is allowed (hold for later).
///
/// ## Example
/// ```rust
/// use kaha_core::money::Money;
/// use kaha_core::validation::validate_amount_tendered;
///
/// assert!(validate_amount_tendered(Money::zero()).is_ok());
/// assert!(validate_amount_tendered(Money::from_cents(-100)).is_err());
/// ```
pub fn validate_amount_tendered(amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: "amount tendered".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_transaction_number() {
        assert!(validate_transaction_number("OR-000123").is_ok());
        assert!(validate_transaction_number("LOCAL-1700000000000").is_ok());

        assert!(validate_transaction_number("").is_err());
        assert!(validate_transaction_number("   ").is_err());
        assert!(validate_transaction_number("OR 123").is_err());
        assert!(validate_transaction_number(&"9".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_customer_name() {
        assert!(validate_customer_name("").is_ok());
        assert!(validate_customer_name("Aling Nena").is_ok());
        assert!(validate_customer_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_table_no() {
        assert!(validate_table_no("").is_ok());
        assert!(validate_table_no("12A").is_ok());
        assert!(validate_table_no(&"1".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  coke ").unwrap(), "coke");
        assert!(validate_search_query(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_discount() {
        let subtotal = Money::from_cents(11200);
        assert!(validate_discount(Money::zero(), subtotal).is_ok());
        assert!(validate_discount(subtotal, subtotal).is_ok());
        assert!(validate_discount(Money::from_cents(11201), subtotal).is_err());
        assert_eq!(
            validate_discount(Money::from_cents(-1), subtotal),
            Err(ValidationError::Negative {
                field: "discount".to_string()
            })
        );
    }

    #[test]
    fn test_validate_amount_tendered() {
        assert!(validate_amount_tendered(Money::zero()).is_ok());
        assert!(validate_amount_tendered(Money::from_cents(50000)).is_ok());
        assert!(validate_amount_tendered(Money::from_cents(-1)).is_err());
    }
}
