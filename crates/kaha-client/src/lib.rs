//! # kaha-client: Register Runtime for Kaha POS
//!
//! This crate connects the pure cart engine in `kaha-core` to the POS
//! backend: it fetches products, issues transaction numbers, submits and
//! updates sales, and logs what happened along the way.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Register Runtime                                 │
//! │                                                                         │
//! │  ┌──────────────────────────────┐  ┌──────────────────────────────┐    │
//! │  │   Register (new sales)       │  │   EditSession (saved sales)  │    │
//! │  │                              │  │                              │    │
//! │  │ Issues numbers with a local  │  │ Loads sale, hydrates cart    │    │
//! │  │ fallback, submits, resets    │  │ Credit + customers, update   │    │
//! │  └──────────────┬───────────────┘  └───────────────┬──────────────┘    │
//! │                 └───────────────┬──────────────────┘                   │
//! │                                 ▼                                       │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     CartSession                                  │   │
//! │  │  Catalog + OrderDraft, barcode scans, search, rejection logging │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ PosBackend (async traits)              │
//! │                                ▼                                        │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     HttpBackend                                  │   │
//! │  │  reqwest + JSON, lenient wire decoding, backend messages kept   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`api`] - Collaborator traits the orchestrators depend on
//! - [`config`] - Backend URL, timeout, terminal defaults
//! - [`error`] - Client error types and user-facing messages
//! - [`http`] - `reqwest` implementation of the collaborators
//! - [`wire`] - JSON shapes the backend speaks
//! - [`session`] - Cart actions against a loaded catalog
//! - [`register`] - New-sale checkout orchestration
//! - [`edit`] - Editing persisted sales
//! - [`telemetry`] - `tracing` subscriber setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kaha_client::{ClientConfig, HttpBackend, Register};
//! use kaha_core::{Money, SubmissionKind, UnitType};
//!
//! kaha_client::telemetry::init_tracing();
//!
//! let config = ClientConfig::load_or_default(None);
//! let backend = HttpBackend::new(&config)?;
//! let mut register = Register::open(backend, config).await?;
//!
//! register.session_mut().add_item(42, UnitType::Retail, 2)?;
//! register.session_mut().draft_mut().set_amount_tendered(Money::from_cents(10_000))?;
//! let sale = register.submit(SubmissionKind::Complete).await?;
//! println!("Change: {}", sale.payload.change);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod config;
pub mod edit;
pub mod error;
pub mod http;
pub mod register;
pub mod session;
pub mod telemetry;
pub mod wire;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{
    BarcodeHit, BarcodeLookup, CatalogService, CustomerDirectory, PosBackend, SaleReceipt,
    SalesGateway, TransactionNumberIssuer,
};
pub use config::{ApiSettings, ClientConfig, TerminalSettings};
pub use edit::EditSession;
pub use error::{ClientError, ClientResult};
pub use http::HttpBackend;
pub use register::{CheckoutPhase, CommittedSale, Register};
pub use session::CartSession;
