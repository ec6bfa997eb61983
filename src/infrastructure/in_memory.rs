use crate::domain::payment::{OrderId, PaymentAnnotation, PaymentId, PaymentRecord};
use crate::domain::ports::{PaymentStore, PosConfigStore, StagingStore};
use crate::domain::pos_config::{PosConfig, PosConfigId};
use crate::domain::staging::StagedPaymentEntry;
use crate::error::{PosError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory staging store.
///
/// Each key maps to the list of tender lines staged for that order. Inserts and
/// removals for a key happen under one write lock, so concurrent requests for
/// different orders never observe each other's partial writes.
#[derive(Default, Clone)]
pub struct InMemoryStagingStore {
    entries: Arc<RwLock<HashMap<String, Vec<StagedPaymentEntry>>>>,
}

impl InMemoryStagingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StagingStore for InMemoryStagingStore {
    async fn append(&self, entry: StagedPaymentEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries
            .entry(entry.client_order_key.clone())
            .or_default()
            .push(entry);
        Ok(())
    }

    async fn entries(&self, key: &str) -> Result<Vec<StagedPaymentEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned().unwrap_or_default())
    }

    async fn take(&self, key: &str) -> Result<Vec<StagedPaymentEntry>> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(key).unwrap_or_default())
    }

    async fn rekey(&self, from: &str, to: &str) -> Result<usize> {
        if from == to {
            return Ok(0);
        }
        let mut entries = self.entries.write().await;
        let Some(moved) = entries.remove(from) else {
            return Ok(0);
        };
        let count = moved.len();
        let target = entries.entry(to.to_string()).or_default();
        target.extend(moved.into_iter().map(|mut e| {
            e.client_order_key = to.to_string();
            e
        }));
        Ok(count)
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut entries = self.entries.write().await;
        let mut purged = 0;
        entries.retain(|_, list| {
            let before = list.len();
            list.retain(|e| e.created_at >= cutoff);
            purged += before - list.len();
            !list.is_empty()
        });
        Ok(purged)
    }

    async fn pending_keys(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }
}

/// A thread-safe in-memory store for payment rows.
///
/// Backed by a `BTreeMap` so listings come back in id order.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<BTreeMap<PaymentId, PaymentRecord>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: PaymentRecord) -> Result<()> {
        let mut payments = self.payments.write().await;
        payments.insert(payment.id, payment);
        Ok(())
    }

    async fn get(&self, id: PaymentId) -> Result<Option<PaymentRecord>> {
        let payments = self.payments.read().await;
        Ok(payments.get(&id).cloned())
    }

    async fn for_order(&self, order_id: OrderId) -> Result<Vec<PaymentRecord>> {
        let payments = self.payments.read().await;
        Ok(payments
            .values()
            .filter(|p| p.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn annotate(&self, id: PaymentId, annotation: &PaymentAnnotation) -> Result<()> {
        let mut payments = self.payments.write().await;
        payments
            .get_mut(&id)
            .ok_or(PosError::PaymentNotFound(id))?
            .annotate(annotation)
    }

    async fn all_payments(&self) -> Result<Vec<PaymentRecord>> {
        let payments = self.payments.read().await;
        Ok(payments.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryPosConfigStore {
    configs: Arc<RwLock<HashMap<PosConfigId, PosConfig>>>,
}

impl InMemoryPosConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PosConfigStore for InMemoryPosConfigStore {
    async fn store(&self, config: PosConfig) -> Result<()> {
        let mut configs = self.configs.write().await;
        configs.insert(config.id, config);
        Ok(())
    }

    async fn get(&self, id: PosConfigId) -> Result<Option<PosConfig>> {
        let configs = self.configs.read().await;
        Ok(configs.get(&id).cloned())
    }
}
