use super::currency::CurrencyId;
use super::payment::{OrderId, PaymentAnnotation, PaymentId, PaymentRecord};
use super::pos_config::{CompanyId, PosConfig, PosConfigId};
use super::staging::StagedPaymentEntry;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

/// Short-lived store of staged multi-currency data, keyed by client order key.
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Appends an entry under its `client_order_key`.
    async fn append(&self, entry: StagedPaymentEntry) -> Result<()>;
    async fn entries(&self, key: &str) -> Result<Vec<StagedPaymentEntry>>;
    /// Removes and returns everything staged under `key`.
    async fn take(&self, key: &str) -> Result<Vec<StagedPaymentEntry>>;
    /// Moves every entry under `from` to `to`, returning how many moved.
    async fn rekey(&self, from: &str, to: &str) -> Result<usize>;
    /// Drops entries created before `cutoff`, returning how many were dropped.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;
    /// Number of keys with staged data.
    async fn pending_keys(&self) -> Result<usize>;
}

/// Host payment rows.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert(&self, payment: PaymentRecord) -> Result<()>;
    async fn get(&self, id: PaymentId) -> Result<Option<PaymentRecord>>;
    async fn for_order(&self, order_id: OrderId) -> Result<Vec<PaymentRecord>>;
    /// Writes multi-currency fields onto an existing row.
    async fn annotate(&self, id: PaymentId, annotation: &PaymentAnnotation) -> Result<()>;
    async fn all_payments(&self) -> Result<Vec<PaymentRecord>>;
}

#[async_trait]
pub trait PosConfigStore: Send + Sync {
    async fn store(&self, config: PosConfig) -> Result<()>;
    async fn get(&self, id: PosConfigId) -> Result<Option<PosConfig>>;
}

/// The host's currency-conversion facility.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Units of `to` per one unit of `from` on `date`.
    async fn rate_for(
        &self,
        from: CurrencyId,
        to: CurrencyId,
        company: CompanyId,
        date: NaiveDate,
    ) -> Result<Decimal>;
}

pub type StagingStoreBox = Box<dyn StagingStore>;
pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type PosConfigStoreBox = Box<dyn PosConfigStore>;
pub type RateProviderBox = Box<dyn RateProvider>;
