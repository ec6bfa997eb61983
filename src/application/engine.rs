use crate::application::reconciler::{ReconcileReport, Reconciler};
use crate::application::stager::Stager;
use crate::domain::event::{EventType, PosEvent};
use crate::domain::payment::{CommittedOrder, PaymentRecord};
use crate::domain::payment_method::PaymentMethodId;
use crate::domain::ports::PaymentStoreBox;
use crate::domain::pos_config::PosConfig;
use crate::error::{PosError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
struct DraftPayment {
    method: PaymentMethodId,
    amount: Decimal,
    line: Option<String>,
}

/// Result of committing one order.
#[derive(Debug)]
pub struct CommitOutcome {
    pub order: CommittedOrder,
    pub payments: Vec<PaymentRecord>,
    /// `None` when the staging store could not be read; the order stands regardless.
    pub reconciliation: Option<ReconcileReport>,
}

/// Drives a POS session: staging calls, draft tender lines and order commits.
///
/// Plays the part of the host's order-commit pathway. It assigns durable ids,
/// creates payment rows, and hands them to the [`Reconciler`] once they exist.
pub struct MultiCurrencyEngine {
    config: PosConfig,
    stager: Stager,
    reconciler: Reconciler,
    payments: PaymentStoreBox,
    drafts: Mutex<HashMap<String, Vec<DraftPayment>>>,
    next_order_id: AtomicU64,
    next_payment_id: AtomicU64,
}

impl MultiCurrencyEngine {
    /// Creates a new engine for one POS configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration whose payment methods tender lines must use.
    /// * `stager` - Receives staged multi-currency data.
    /// * `reconciler` - Reattaches staged data after each commit.
    /// * `payments` - The store payment rows are created in.
    pub fn new(
        config: PosConfig,
        stager: Stager,
        reconciler: Reconciler,
        payments: PaymentStoreBox,
    ) -> Self {
        Self {
            config,
            stager,
            reconciler,
            payments,
            drafts: Mutex::new(HashMap::new()),
            next_order_id: AtomicU64::new(1),
            next_payment_id: AtomicU64::new(1),
        }
    }

    /// Continues id sequences after rows already present in a persistent store.
    pub async fn restore(&self) -> Result<()> {
        let existing = self.payments.all_payments().await?;
        if let Some(max_payment) = existing.iter().map(|p| p.id).max() {
            self.next_payment_id.fetch_max(max_payment + 1, Ordering::SeqCst);
        }
        if let Some(max_order) = existing.iter().map(|p| p.order_id).max() {
            self.next_order_id.fetch_max(max_order + 1, Ordering::SeqCst);
        }
        if !existing.is_empty() {
            info!(payments = existing.len(), "Restored payment sequence from store");
        }
        Ok(())
    }

    pub fn stager(&self) -> &Stager {
        &self.stager
    }

    pub async fn process_event(&self, event: PosEvent) -> Result<()> {
        match event.r#type {
            EventType::Stage => {
                self.stager.stage(event.staging_request()).await?;
            }
            EventType::Pay => {
                self.add_payment(&event.order, event.method, event.amount, event.line)
                    .await?;
            }
            EventType::Commit => {
                self.commit_order(&event.order, event.reference).await?;
            }
        }
        Ok(())
    }

    /// Adds a base-currency tender line to the client's draft order.
    pub async fn add_payment(
        &self,
        order_key: &str,
        method: Option<PaymentMethodId>,
        amount: Option<Decimal>,
        line: Option<String>,
    ) -> Result<()> {
        let method = method.ok_or(PosError::MissingField("payment_method_id"))?;
        let amount = amount.ok_or(PosError::MissingField("amount"))?;
        if self.config.method(method).is_none() {
            return Err(PosError::ValidationError(format!(
                "Payment method {method} is not available in POS configuration '{}'",
                self.config.name
            )));
        }

        let mut drafts = self.drafts.lock().await;
        drafts
            .entry(order_key.to_string())
            .or_default()
            .push(DraftPayment {
                method,
                amount,
                line,
            });
        Ok(())
    }

    /// Commits a draft order: creates the order and its payment rows, then reconciles.
    pub async fn commit_order(
        &self,
        order_key: &str,
        pos_reference: Option<String>,
    ) -> Result<CommitOutcome> {
        let drafts = self
            .drafts
            .lock()
            .await
            .remove(order_key)
            .unwrap_or_default();

        let order = CommittedOrder {
            id: self.next_order_id.fetch_add(1, Ordering::SeqCst),
            client_uuid: Some(order_key.to_string()),
            pos_reference,
        };

        let mut payments = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let mut payment = PaymentRecord::new(
                self.next_payment_id.fetch_add(1, Ordering::SeqCst),
                order.id,
                draft.method,
                draft.amount,
            );
            payment.tender_line_id = draft.line;
            self.payments.insert(payment.clone()).await?;
            payments.push(payment);
        }
        info!(order = order.id, client_key = order_key, payments = payments.len(), "Committed order");

        // Staging housekeeping must never block the commit.
        if let Err(e) = self.stager.alias(order_key, &order.id.to_string()).await {
            warn!(order = order.id, error = %e, "Failed to re-key staged payments");
        }

        let reconciliation = match self.reconciler.reconcile(&order, &payments).await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(order = order.id, error = %e, "Reconciliation skipped");
                None
            }
        };

        // Swept only after this order has claimed its own entries, however old.
        if let Err(e) = self.stager.sweep(Utc::now()).await {
            warn!(error = %e, "Failed to sweep staged payments");
        }

        let payments = self.payments.for_order(order.id).await?;
        Ok(CommitOutcome {
            order,
            payments,
            reconciliation,
        })
    }

    /// Consumes the engine and returns every payment row in the store.
    pub async fn into_results(self) -> Result<Vec<PaymentRecord>> {
        let pending = self.drafts.lock().await.len();
        if pending > 0 {
            warn!(pending, "Draft orders were never committed");
        }
        self.payments.all_payments().await
    }
}
