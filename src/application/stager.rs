use crate::domain::ports::StagingStoreBox;
use crate::domain::staging::{StagePaymentRequest, StagedPaymentEntry, WirePaymentLine};
use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

/// Default lifetime, in seconds, of staged data that no order ever claimed.
pub const DEFAULT_STAGING_TTL_SECS: i64 = 3600;

/// Accepts multi-currency tender data before its order exists server-side.
pub struct Stager {
    store: StagingStoreBox,
    ttl: Duration,
}

impl Stager {
    pub fn new(store: StagingStoreBox) -> Self {
        Self::with_ttl(store, Duration::seconds(DEFAULT_STAGING_TTL_SECS))
    }

    pub fn with_ttl(store: StagingStoreBox, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stages one tender line under its client order key.
    ///
    /// Duplicate submissions are appended as-is; reconciliation discards the extras.
    pub async fn stage(&self, request: StagePaymentRequest) -> Result<StagedPaymentEntry> {
        self.stage_at(request, Utc::now()).await
    }

    pub async fn stage_at(
        &self,
        request: StagePaymentRequest,
        now: DateTime<Utc>,
    ) -> Result<StagedPaymentEntry> {
        let entry = request.into_entry(now)?;
        self.store.append(entry.clone()).await?;
        info!(
            order = %entry.client_order_key,
            method = entry.payment_method_id,
            currency = entry.payment_currency_id,
            amount = %entry.amount_in_currency,
            rate = %entry.exchange_rate,
            "Staged multi-currency payment"
        );
        Ok(entry)
    }

    /// Stages every multi-currency line of an exported order payload.
    ///
    /// All lines are validated before any is stored, so a malformed line blocks
    /// the whole submission.
    pub async fn stage_wire_lines(
        &self,
        order_key: &str,
        lines: &[WirePaymentLine],
    ) -> Result<Vec<StagedPaymentEntry>> {
        let now = Utc::now();
        let entries = lines
            .iter()
            .filter_map(|line| line.staging_request(order_key))
            .map(|request| request.into_entry(now))
            .collect::<Result<Vec<_>>>()?;

        for entry in &entries {
            self.store.append(entry.clone()).await?;
        }
        debug!(order = order_key, staged = entries.len(), total = lines.len(), "Staged payment lines from order payload");
        Ok(entries)
    }

    /// Moves staged data from the client key to the durable order key.
    pub async fn alias(&self, from: &str, to: &str) -> Result<usize> {
        let moved = self.store.rekey(from, to).await?;
        if moved > 0 {
            debug!(from, to, moved, "Re-keyed staged payments");
        }
        Ok(moved)
    }

    /// Drops entries older than the TTL relative to `now`.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<usize> {
        let purged = self.store.purge_older_than(now - self.ttl).await?;
        if purged > 0 {
            info!(purged, ttl_secs = self.ttl.num_seconds(), "Swept abandoned staged payments");
        }
        Ok(purged)
    }
}
