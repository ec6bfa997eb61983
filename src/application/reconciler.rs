use crate::domain::currency::CurrencyBook;
use crate::domain::payment::{CommittedOrder, PaymentId, PaymentRecord};
use crate::domain::payment_method::PaymentMethodId;
use crate::domain::ports::{PaymentStoreBox, StagingStoreBox};
use crate::domain::staging::StagedPaymentEntry;
use crate::error::{PosError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Maximum base-amount difference for two tenders to be considered the same line.
pub const DEFAULT_AMOUNT_TOLERANCE: Decimal = dec!(0.01);

/// What happened to one staged entry during reconciliation.
#[derive(Debug)]
pub enum EntryOutcome {
    Applied {
        payment_id: PaymentId,
        payment_method_id: PaymentMethodId,
    },
    /// No unclaimed payment row matched. Expected for duplicate submissions.
    Unmatched { payment_method_id: PaymentMethodId },
    /// A row matched but writing to it failed.
    Failed {
        payment_id: PaymentId,
        payment_method_id: PaymentMethodId,
        error: PosError,
    },
}

#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// The candidate key staged data was found under, if any.
    pub matched_key: Option<String>,
    pub outcomes: Vec<EntryOutcome>,
    /// Staged entries removed across all candidate keys.
    pub evicted: usize,
}

impl ReconcileReport {
    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Applied { .. }))
    }

    pub fn unmatched(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Unmatched { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, EntryOutcome::Failed { .. }))
    }

    pub fn is_noop(&self) -> bool {
        self.matched_key.is_none()
    }

    fn count(&self, pred: impl Fn(&EntryOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Reattaches staged multi-currency data to committed payment rows.
pub struct Reconciler {
    staging: StagingStoreBox,
    payments: PaymentStoreBox,
    currencies: CurrencyBook,
    tolerance: Decimal,
}

impl Reconciler {
    pub fn new(staging: StagingStoreBox, payments: PaymentStoreBox, currencies: CurrencyBook) -> Self {
        Self {
            staging,
            payments,
            currencies,
            tolerance: DEFAULT_AMOUNT_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Runs once per committed order, after its payment rows exist.
    ///
    /// Only a failure to read the staging store is returned as an error. Every
    /// per-entry problem is recorded in the report and logged, and the order
    /// commit is never affected by it.
    pub async fn reconcile(
        &self,
        order: &CommittedOrder,
        committed: &[PaymentRecord],
    ) -> Result<ReconcileReport> {
        let keys = order.candidate_keys();
        let mut report = ReconcileReport::default();

        let mut staged = Vec::new();
        for key in &keys {
            let entries = self.staging.entries(key).await?;
            if !entries.is_empty() {
                report.matched_key = Some(key.clone());
                staged = entries;
                break;
            }
        }

        match &report.matched_key {
            Some(key) => debug!(order = order.id, key = %key, entries = staged.len(), payments = committed.len(), "Reconciling staged payments"),
            None => debug!(order = order.id, ?keys, "No staged multi-currency data"),
        }

        let mut claimed = HashSet::new();
        for entry in &staged {
            let outcome = match select_payment(entry, committed, &claimed, self.tolerance) {
                Some(payment) => {
                    claimed.insert(payment.id);
                    match self.apply(payment.id, entry).await {
                        Ok(()) => {
                            info!(order = order.id, payment = payment.id, method = entry.payment_method_id, currency = entry.payment_currency_id, "Applied multi-currency data to payment");
                            EntryOutcome::Applied {
                                payment_id: payment.id,
                                payment_method_id: entry.payment_method_id,
                            }
                        }
                        Err(e) => {
                            error!(order = order.id, payment = payment.id, error = %e, "Failed to write multi-currency data");
                            EntryOutcome::Failed {
                                payment_id: payment.id,
                                payment_method_id: entry.payment_method_id,
                                error: e,
                            }
                        }
                    }
                }
                None => {
                    warn!(order = order.id, method = entry.payment_method_id, "No matching payment for staged entry");
                    EntryOutcome::Unmatched {
                        payment_method_id: entry.payment_method_id,
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        // Every candidate key is cleared so nothing can replay onto a later order.
        for key in &keys {
            match self.staging.take(key).await {
                Ok(removed) => report.evicted += removed.len(),
                Err(e) => error!(order = order.id, key = %key, error = %e, "Failed to evict staged payments"),
            }
        }

        Ok(report)
    }

    async fn apply(&self, payment_id: PaymentId, entry: &StagedPaymentEntry) -> Result<()> {
        self.currencies.require(entry.payment_currency_id)?;
        self.payments.annotate(payment_id, &entry.annotation()).await
    }
}

/// Picks the committed row a staged entry belongs to.
///
/// A tender-line id, when both sides carry one, is matched exactly. Otherwise rows
/// with the entry's payment method are candidates; several candidates are
/// narrowed by base amount, and the first remaining one wins.
fn select_payment<'a>(
    entry: &StagedPaymentEntry,
    committed: &'a [PaymentRecord],
    claimed: &HashSet<PaymentId>,
    tolerance: Decimal,
) -> Option<&'a PaymentRecord> {
    let candidates: Vec<&PaymentRecord> = committed
        .iter()
        .filter(|p| {
            p.payment_method_id == entry.payment_method_id
                && !claimed.contains(&p.id)
                && !p.is_annotated()
        })
        .collect();

    if let Some(line) = entry.tender_line_id.as_deref()
        && candidates.iter().any(|p| p.tender_line_id.is_some())
    {
        return candidates
            .into_iter()
            .find(|p| p.tender_line_id.as_deref() == Some(line));
    }

    // Without a representable expected amount the first candidate wins.
    if candidates.len() > 1
        && let Some(expected) = entry.expected_base_amount()
        && let Some(payment) = candidates
            .iter()
            .copied()
            .find(|p| p.amount.checked_sub(expected).is_some_and(|d| d.abs() < tolerance))
    {
        return Some(payment);
    }

    candidates.first().copied()
}
