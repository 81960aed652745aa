//! # Edit Session
//!
//! Re-opens a persisted sale, lets the cashier change it, and saves it
//! back in place.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   load(sale_id) ──► OriginalOrder ──► editable? ──► draft hydrated      │
//! │                                           │          from its lines    │
//! │                                           └── no ──► OrderNotEditable   │
//! │                                                                         │
//! │   save() ──► fresh catalog ──► validate_edit ──► PUT update ──► reload  │
//! │                                     │                                   │
//! │                                     └── only net growth per product     │
//! │                                         is checked against stock        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Credit is only offered here. Choosing it fetches the customer list; an
//! empty or unreachable list blocks the save.

use kaha_core::reconcile::validate_edit;
use kaha_core::{
    Catalog, CheckoutPayload, CoreError, CustomerAccount, OriginalOrder, PaymentMethod,
};
use tracing::{error, info, warn};

use crate::api::PosBackend;
use crate::error::{ClientError, ClientResult};
use crate::register::{CheckoutPhase, CommittedSale};
use crate::session::CartSession;

/// An open edit of one persisted sale.
pub struct EditSession<B> {
    backend: B,
    original: OriginalOrder,
    session: CartSession,
    customers: Vec<CustomerAccount>,
    phase: CheckoutPhase,
}

impl<B: PosBackend> EditSession<B> {
    /// Loads sale `sale_id` for editing and the product grid for `category`.
    pub async fn load(backend: B, sale_id: i64, category: Option<i64>) -> ClientResult<Self> {
        let original = backend.load_sale(sale_id).await?;
        if let Err(err) = original.ensure_editable() {
            warn!(sale_id, reason = %err, "Sale cannot be edited");
            return Err(err.into());
        }

        let mut edit = EditSession {
            session: CartSession::new(original.to_draft(), Catalog::default(), category),
            backend,
            original,
            customers: Vec::new(),
            phase: CheckoutPhase::Idle,
        };

        if let Err(err) = edit.session.refresh_catalog(&edit.backend).await {
            warn!(sale_id, error = %err, "Could not load products for edit");
        }
        if edit.session.draft().payment_method() == PaymentMethod::Credit {
            edit.load_customers().await;
        }

        info!(
            sale_id,
            transaction = %edit.original.header().transaction_number,
            lines = edit.original.lines().len(),
            "Sale opened for edit"
        );
        Ok(edit)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The sale as last loaded from the backend.
    pub fn original(&self) -> &OriginalOrder {
        &self.original
    }

    pub fn session(&self) -> &CartSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut CartSession {
        &mut self.session
    }

    pub fn customers(&self) -> &[CustomerAccount] {
        &self.customers
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    // =========================================================================
    // Payment & customer
    // =========================================================================

    async fn load_customers(&mut self) {
        self.customers = match self.backend.fetch_customers().await {
            Ok(customers) => customers,
            Err(err) => {
                warn!(error = %err, "Could not load customers");
                Vec::new()
            }
        };
    }

    /// Switches payment method. Credit loads the customer list.
    pub async fn set_payment_method(&mut self, method: PaymentMethod) -> ClientResult<()> {
        self.session.draft_mut().set_payment_method(method)?;
        if method == PaymentMethod::Credit {
            self.load_customers().await;
        } else {
            self.customers.clear();
        }
        Ok(())
    }

    /// Picks a credit customer from the loaded list.
    pub fn select_customer(&mut self, customer_id: i64) -> ClientResult<()> {
        let account = self
            .customers
            .iter()
            .find(|c| c.id == customer_id)
            .cloned()
            .ok_or(ClientError::Core(CoreError::CustomerRequired))?;
        self.session.draft_mut().select_customer(account);
        Ok(())
    }

    // =========================================================================
    // Save
    // =========================================================================

    /// Validates the edit against fresh stock and replaces the sale.
    ///
    /// After a successful save the sale is reloaded so further edits start
    /// from what the backend now holds.
    pub async fn save(&mut self) -> ClientResult<CommittedSale> {
        self.phase = CheckoutPhase::Validating;
        let sale_id = self.original.sale_id();

        let fresh = match self.backend.fetch_products(None).await {
            Ok(products) => Catalog::new(products),
            Err(err) => {
                error!(sale_id, error = %err, "Could not re-check stock before update");
                self.phase = CheckoutPhase::Failed;
                return Err(err);
            }
        };

        if let Err(err) = validate_edit(
            self.session.draft(),
            &self.original,
            &fresh,
            !self.customers.is_empty(),
        ) {
            warn!(sale_id, reason = %err, "Update rejected");
            self.phase = CheckoutPhase::Rejected;
            return Err(ClientError::Core(err));
        }

        let payload = CheckoutPayload::for_update(self.session.draft(), &fresh);
        self.phase = CheckoutPhase::Submitting;
        info!(
            sale_id,
            transaction = %payload.transaction_number,
            lines = payload.lines.len(),
            total = %payload.breakdown.total,
            "Updating sale"
        );

        let receipt = match self.backend.update_sale(sale_id, &payload).await {
            Ok(receipt) => receipt,
            Err(err) => {
                error!(sale_id, error = %err, "Update failed");
                self.phase = CheckoutPhase::Failed;
                return Err(err);
            }
        };
        self.phase = CheckoutPhase::Committed;

        match self.backend.load_sale(sale_id).await {
            Ok(reloaded) => {
                self.session.replace_draft(reloaded.to_draft());
                self.original = reloaded;
            }
            Err(err) => warn!(sale_id, error = %err, "Saved, but could not reload the sale"),
        }

        Ok(CommittedSale { payload, receipt })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
