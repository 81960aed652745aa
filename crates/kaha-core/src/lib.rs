//! # kaha-core: Cart & Checkout Engine for Kaha POS
//!
//! This crate is the **heart** of Kaha POS. It holds the cart, stock and
//! VAT rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kaha POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Cashier Frontend                             │   │
//! │  │    Product grid ──► Cart ──► Tender panel ──► Receipt          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kaha-client                                  │   │
//! │  │    CartSession, Register (new sales), EditSession, HTTP API     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kaha-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   stock   │  │    vat    │  │   cart    │  │ checkout  │  │   │
//! │  │   │ StockView │  │ Breakdown │  │ LineItem  │  │ Shortfall │  │   │
//! │  │   │ max_add.. │  │  12% VAT  │  │   Cart    │  │  Payload  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   order   │  │ reconcile │  │   money   │                  │   │
//! │  │   │  Draft    │  │ net delta │  │  Money    │                  │   │
//! │  │   │ Original  │  │ for edits │  │ centavos  │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO LOGGING • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    POS Backend (HTTP)                           │   │
//! │  │         Source of truth for stock, numbers and sales            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, UnitType, PaymentMethod, SaleStatus)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`stock`] - Retail-equivalent stock ledger
//! - [`vat`] - VAT-inclusive breakdown
//! - [`cart`] - Cart store and line items
//! - [`catalog`] - In-memory product list
//! - [`checkout`] - Submission validation and payload
//! - [`reconcile`] - Net-change stock check for edited sales
//! - [`order`] - Order draft, transaction numbers, original orders
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every calculation is deterministic
//! 2. **No I/O**: Network, file system and logging are FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in centavos (i64)
//! 4. **Explicit Errors**: A rejected action returns `Err` and changes nothing
//!
//! ## Example Usage
//!
//! ```rust
//! use kaha_core::money::Money;
//! use kaha_core::VAT_RATE;
//!
//! // ₱112.00 shelf price, VAT included
//! let gross = Money::from_cents(11200);
//!
//! assert_eq!(gross.exclusive_of_tax(VAT_RATE).cents(), 10000);
//! assert_eq!(gross.inclusive_tax(VAT_RATE).cents(), 1200);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod money;
pub mod order;
pub mod reconcile;
pub mod stock;
pub mod types;
pub mod validation;
pub mod vat;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use kaha_core::Money` instead of
// `use kaha_core::money::Money`

pub use cart::{Cart, CartSummary, LineItem, LineSnapshot};
pub use catalog::Catalog;
pub use checkout::{CheckoutPayload, PayloadLine, ShortfallReport, StockShortfall, SubmissionKind};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{Customer, OrderDraft, OriginalOrder, SaleHeader, TransactionNumber};
pub use stock::StockView;
pub use types::*;
pub use vat::VatBreakdown;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Philippine VAT, included in shelf prices.
pub const VAT_RATE: TaxRate = TaxRate::from_bps(1200);

/// Maximum lines allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps a sale printable on one receipt roll.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity on a single line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Prefix of transaction numbers made up locally when the issuer is down.
pub const LOCAL_NUMBER_PREFIX: &str = "LOCAL";
