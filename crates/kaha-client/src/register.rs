//! # Register
//!
//! Orchestrates new sales: numbering, submission and the reset that
//! follows a committed sale.
//!
//! ## Submission State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Idle ──submit()──► Validating ──┬── refused ──────► Rejected          │
//! │                          │        │   (empty cart, tender, shortfall)   │
//! │                          │        │                                     │
//! │                          │        └── ok ──► Submitting ──┬─► Committed │
//! │                          │                                │             │
//! │                          └── catalog fetch failed ────────┴─► Failed    │
//! │                                                                         │
//! │   Rejected / Failed: cart untouched, submit() may be called again.     │
//! │   Committed: draft reset, new number issued, grid re-fetched.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is checked twice: the cart predicts against the catalog it was
//! built from, then `submit` re-reads the whole catalog and checks again
//! before anything is sent.

use chrono::{Local, NaiveDate, Utc};
use kaha_core::checkout::validate_submission;
use kaha_core::{Catalog, CheckoutPayload, OrderDraft, SubmissionKind, TransactionNumber};
use tracing::{error, info, warn};

use crate::api::{PosBackend, SaleReceipt};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::CartSession;

/// Where the last submission stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Validating,
    /// Refused locally; nothing was sent.
    Rejected,
    Submitting,
    Committed,
    /// Sent (or about to be) and failed in transport or at the backend.
    Failed,
}

/// A committed sale, kept for the receipt step.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedSale {
    pub payload: CheckoutPayload,
    pub receipt: SaleReceipt,
}

/// One register ringing up new sales.
pub struct Register<B> {
    backend: B,
    config: ClientConfig,
    session: CartSession,
    phase: CheckoutPhase,
    last_sale: Option<CommittedSale>,
    number_warning: Option<String>,
}

impl<B: PosBackend> Register<B> {
    /// Opens the register: issues a number and loads the grid.
    ///
    /// A failed grid load leaves an empty catalog and is logged; the
    /// cashier can switch tabs to retry.
    pub async fn open(backend: B, config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let category = config.terminal.default_category;
        let draft = OrderDraft::new(TransactionNumber::local_fallback(config.local_number_prefix(), Utc::now()), today());
        let mut register = Register {
            backend,
            config,
            session: CartSession::new(draft, Catalog::default(), category),
            phase: CheckoutPhase::Idle,
            last_sale: None,
            number_warning: None,
        };

        register.start_next_sale().await;
        info!(
            transaction = %register.session.draft().transaction_number(),
            store = %register.config.terminal.store_name,
            "Register open"
        );
        Ok(register)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn session(&self) -> &CartSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut CartSession {
        &mut self.session
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    /// The most recent committed sale, for printing.
    pub fn last_sale(&self) -> Option<&CommittedSale> {
        self.last_sale.as_ref()
    }

    /// Set when the current number was made up locally.
    pub fn number_warning(&self) -> Option<&str> {
        self.number_warning.as_deref()
    }

    /// Whether the current draft carries a locally made number.
    pub fn has_local_number(&self) -> bool {
        self.session
            .draft()
            .transaction_number()
            .is_local(self.config.local_number_prefix())
    }

    /// Scans a barcode into the cart.
    pub async fn scan_barcode(&mut self, code: &str) -> ClientResult<()> {
        self.session.scan_barcode(&self.backend, code).await.map(|_| ())
    }

    pub async fn select_category(&mut self, category: Option<i64>) -> ClientResult<()> {
        self.session.select_category(&self.backend, category).await
    }

    // =========================================================================
    // Numbering
    // =========================================================================

    /// Asks the backend for the next number, falling back to a local one.
    async fn issue_number(&mut self) -> TransactionNumber {
        match self.backend.next_transaction_number().await {
            Ok(number) => {
                self.number_warning = None;
                number
            }
            Err(err) => {
                let number = TransactionNumber::local_fallback(self.config.local_number_prefix(), Utc::now());
                warn!(error = %err, fallback = %number, "Transaction number issuer unavailable");
                self.number_warning = Some(format!(
                    "Could not get a transaction number from the server. Using {} for now.",
                    number
                ));
                number
            }
        }
    }

    /// Clears the draft for a new sale: fresh number, default payment
    /// method, re-fetched grid.
    async fn start_next_sale(&mut self) {
        let number = self.issue_number().await;
        let mut draft = OrderDraft::new(number, today());
        if let Err(err) = draft.set_payment_method(self.config.terminal.default_payment_method) {
            warn!(error = %err, "Ignoring configured default payment method");
        }
        self.session.replace_draft(draft);

        if let Err(err) = self.session.refresh_catalog(&self.backend).await {
            warn!(error = %err, "Could not refresh products for the next sale");
        }
    }

    /// Abandons the current draft.
    pub async fn reset(&mut self) {
        info!(transaction = %self.session.draft().transaction_number(), "Draft discarded");
        self.phase = CheckoutPhase::Idle;
        self.start_next_sale().await;
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Validates and sends the current draft.
    ///
    /// On `Err` the cart is exactly as it was. On `Ok` the sale is saved
    /// and the register has moved on to the next one.
    pub async fn submit(&mut self, kind: SubmissionKind) -> ClientResult<CommittedSale> {
        self.phase = CheckoutPhase::Validating;
        let number = self.session.draft().transaction_number().clone();

        let fresh = match self.backend.fetch_products(None).await {
            Ok(products) => Catalog::new(products),
            Err(err) => {
                error!(transaction = %number, error = %err, "Could not re-check stock before checkout");
                self.phase = CheckoutPhase::Failed;
                return Err(err);
            }
        };

        if let Err(err) = validate_submission(self.session.draft(), &fresh, kind) {
            warn!(transaction = %number, reason = %err, "Checkout rejected");
            self.phase = CheckoutPhase::Rejected;
            return Err(ClientError::Core(err));
        }

        let payload = CheckoutPayload::for_new_sale(self.session.draft(), &fresh, kind);
        self.phase = CheckoutPhase::Submitting;
        info!(
            transaction = %number,
            ?kind,
            lines = payload.lines.len(),
            total = %payload.breakdown.total,
            "Submitting sale"
        );

        let receipt = match self.backend.submit_sale(&payload).await {
            Ok(receipt) => receipt,
            Err(err) => {
                error!(transaction = %number, error = %err, "Checkout failed");
                self.phase = CheckoutPhase::Failed;
                return Err(err);
            }
        };

        self.phase = CheckoutPhase::Committed;
        let sale = CommittedSale { payload, receipt };
        self.last_sale = Some(sale.clone());
        self.start_next_sale().await;
        Ok(sale)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{product, FakeBackend};
    use kaha_core::{CoreError, Money, PaymentMethod, SaleStatus, UnitType};

    async fn open(products: Vec<kaha_core::Product>) -> Register<FakeBackend> {
        Register::open(FakeBackend::with_products(products), ClientConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_issues_number_and_loads_grid() {
        let register = open(vec![product(1, 5, 0, 1)]).await;
        assert_eq!(register.session().draft().transaction_number().as_str(), "OR-000001");
        assert_eq!(register.session().catalog().len(), 1);
        assert!(register.number_warning().is_none());
        assert!(!register.has_local_number());
        assert_eq!(register.phase(), CheckoutPhase::Idle);
    }

    #[tokio::test]
    async fn test_issuer_down_falls_back_to_local_number() {
        let backend = FakeBackend::with_products(vec![]);
        backend.state().issuer_down = true;
        let register = Register::open(backend, ClientConfig::default()).await.unwrap();

        let number = register.session().draft().transaction_number();
        assert!(number.is_local(kaha_core::LOCAL_NUMBER_PREFIX));
        assert!(number.sequence().parse::<i64>().is_ok());
        assert!(register.has_local_number());
        assert!(register.number_warning().is_some());
    }

    #[tokio::test]
    async fn test_local_prefix_comes_from_config() {
        let backend = FakeBackend::default();
        backend.state().issuer_down = true;
        let mut config = ClientConfig::default();
        config.terminal.local_number_prefix = "REG2".into();

        let register = Register::open(backend, config).await.unwrap();
        assert_eq!(register.session().draft().transaction_number().prefix(), "REG2");
        assert!(register.has_local_number());
    }

    #[tokio::test]
    async fn test_scenario_c_tender_zero_is_rejected() {
        let mut register = open(vec![product(1, 5, 0, 1)]).await;
        register.session_mut().add_item(1, UnitType::Retail, 2).unwrap();
        let before = register.session().cart().lines().to_vec();

        let err = register.submit(SubmissionKind::Complete).await.unwrap_err();
        assert!(matches!(err, ClientError::Core(CoreError::InsufficientTender { .. })));
        assert_eq!(register.phase(), CheckoutPhase::Rejected);
        assert_eq!(register.session().cart().lines(), before.as_slice());
        assert!(register.backend().state().submitted.is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let mut register = open(vec![]).await;
        let err = register.submit(SubmissionKind::HoldForLater).await.unwrap_err();
        assert!(matches!(err, ClientError::Core(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_complete_sale_commits_and_resets() {
        let mut register = open(vec![product(1, 5, 0, 1)]).await;
        register.session_mut().add_item(1, UnitType::Retail, 2).unwrap();
        register
            .session_mut()
            .draft_mut()
            .set_amount_tendered(Money::from_cents(5000))
            .unwrap();

        let sale = register.submit(SubmissionKind::Complete).await.unwrap();
        assert_eq!(sale.payload.status, Some(SaleStatus::Paid));
        assert_eq!(sale.payload.change, Money::from_cents(1000));
        assert_eq!(sale.payload.transaction_number.as_str(), "OR-000001");
        assert_eq!(register.phase(), CheckoutPhase::Committed);

        // next sale
        assert!(register.session().cart().is_empty());
        assert_eq!(register.session().draft().transaction_number().as_str(), "OR-000002");
        assert_eq!(register.session().draft().amount_tendered(), Money::zero());
        assert_eq!(register.last_sale(), Some(&sale));
        assert_eq!(register.backend().state().submitted.len(), 1);
    }

    #[tokio::test]
    async fn test_hold_for_later_zeroes_tender() {
        let mut register = open(vec![product(1, 5, 0, 1)]).await;
        register.session_mut().add_item(1, UnitType::Retail, 1).unwrap();
        register
            .session_mut()
            .draft_mut()
            .set_amount_tendered(Money::from_cents(10000))
            .unwrap();

        let sale = register.submit(SubmissionKind::HoldForLater).await.unwrap();
        assert_eq!(sale.payload.status, Some(SaleStatus::Unpaid));
        assert_eq!(sale.payload.amount_tendered, Money::zero());
        assert_eq!(sale.payload.change, Money::zero());
    }

    #[tokio::test]
    async fn test_stale_stock_is_caught_on_submit() {
        let mut register = open(vec![product(1, 5, 0, 1)]).await;
        register.session_mut().add_item(1, UnitType::Retail, 4).unwrap();
        register
            .session_mut()
            .draft_mut()
            .set_amount_tendered(Money::from_cents(10000))
            .unwrap();

        // another register sold three in the meantime
        register.backend().set_stock(1, 2, 0);

        match register.submit(SubmissionKind::Complete).await {
            Err(ClientError::Core(CoreError::StockShortfall(report))) => {
                assert_eq!(report.len(), 1);
                assert!(report.to_string().starts_with("Product 1: Needed 4 pc"));
            }
            other => panic!("expected shortfall, got {:?}", other.map(|s| s.payload)),
        }
        assert_eq!(register.session().cart().line(1, UnitType::Retail).unwrap().quantity, 4);
    }

    #[tokio::test]
    async fn test_backend_refusal_keeps_cart_and_message() {
        let mut register = open(vec![product(1, 5, 0, 1)]).await;
        register.session_mut().add_item(1, UnitType::Retail, 1).unwrap();
        register.backend().state().refuse_sales = Some("Transaction number already used".into());

        let err = register.submit(SubmissionKind::HoldForLater).await.unwrap_err();
        assert_eq!(err.user_message(), "Transaction number already used");
        assert_eq!(register.phase(), CheckoutPhase::Failed);
        assert_eq!(register.session().cart().len(), 1);

        // retry once the backend recovers
        register.backend().state().refuse_sales = None;
        assert!(register.submit(SubmissionKind::HoldForLater).await.is_ok());
    }

    #[tokio::test]
    async fn test_catalog_outage_fails_submission() {
        let mut register = open(vec![product(1, 5, 0, 1)]).await;
        register.session_mut().add_item(1, UnitType::Retail, 1).unwrap();
        register.backend().state().catalog_down = true;

        assert!(register.submit(SubmissionKind::HoldForLater).await.unwrap_err().is_retryable());
        assert_eq!(register.phase(), CheckoutPhase::Failed);
        assert_eq!(register.session().cart().len(), 1);
    }

    #[tokio::test]
    async fn test_default_payment_method_applies_to_each_sale() {
        let mut config = ClientConfig::default();
        config.terminal.default_payment_method = PaymentMethod::GCash;
        let mut register = Register::open(FakeBackend::with_products(vec![]), config).await.unwrap();
        assert_eq!(register.session().draft().payment_method(), PaymentMethod::GCash);

        register
            .session_mut()
            .draft_mut()
            .set_payment_method(PaymentMethod::Cash)
            .unwrap();
        register.reset().await;
        assert_eq!(register.session().draft().payment_method(), PaymentMethod::GCash);
    }

    #[tokio::test]
    async fn test_credit_is_not_offered_for_new_sales() {
        let mut register = open(vec![]).await;
        let err = register
            .session_mut()
            .draft_mut()
            .set_payment_method(PaymentMethod::Credit)
            .unwrap_err();
        assert_eq!(err, CoreError::PaymentMethodNotAllowed { method: PaymentMethod::Credit });
    }
}
