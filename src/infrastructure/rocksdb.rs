use crate::domain::payment::{OrderId, PaymentAnnotation, PaymentId, PaymentRecord};
use crate::domain::ports::{PaymentStore, StagingStore};
use crate::domain::staging::StagedPaymentEntry;
use crate::error::{PosError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for staged multi-currency data, keyed by client order key.
pub const CF_STAGED: &str = "staged_payments";
/// Column Family for payment rows, keyed by big-endian payment id.
pub const CF_PAYMENTS: &str = "payments";

/// A persistent store implementation using RocksDB.
///
/// Keeps staged payments and payment rows in separate Column Families as JSON
/// values. Read-modify-write sequences (appending to a staged list, annotating a
/// row) are serialized through a single writer lock.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_staged = ColumnFamilyDescriptor::new(CF_STAGED, Options::default());
        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_staged, cf_payments])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PosError::InternalError(Box::new(std::io::Error::other(format!(
                "Column family {name} not found"
            ))))
        })
    }

    fn read<T: DeserializeOwned>(&self, cf: &'static str, key: &[u8]) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, cf: &'static str, key: &[u8], value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(self.cf(cf)?, key, bytes)?;
        Ok(())
    }

    fn scan<T: DeserializeOwned>(&self, cf: &'static str) -> Result<Vec<(Box<[u8]>, T)>> {
        let mut items = Vec::new();
        for item in self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start) {
            let (key, value) = item?;
            items.push((key, decode(&value)?));
        }
        Ok(items)
    }

    fn staged(&self, key: &str) -> Result<Vec<StagedPaymentEntry>> {
        Ok(self.read(CF_STAGED, key.as_bytes())?.unwrap_or_default())
    }

    fn remove_staged(&self, key: &str) -> Result<Vec<StagedPaymentEntry>> {
        let entries = self.staged(key)?;
        if !entries.is_empty() {
            self.db.delete_cf(self.cf(CF_STAGED)?, key.as_bytes())?;
        }
        Ok(entries)
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        PosError::InternalError(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Deserialization error: {e}"),
        )))
    })
}

#[async_trait]
impl StagingStore for RocksDBStore {
    async fn append(&self, entry: StagedPaymentEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let key = entry.client_order_key.clone();
        let mut entries = self.staged(&key)?;
        entries.push(entry);
        self.write(CF_STAGED, key.as_bytes(), &entries)
    }

    async fn entries(&self, key: &str) -> Result<Vec<StagedPaymentEntry>> {
        self.staged(key)
    }

    async fn take(&self, key: &str) -> Result<Vec<StagedPaymentEntry>> {
        let _guard = self.write_lock.lock().await;
        self.remove_staged(key)
    }

    async fn rekey(&self, from: &str, to: &str) -> Result<usize> {
        if from == to {
            return Ok(0);
        }
        let _guard = self.write_lock.lock().await;
        let moved = self.remove_staged(from)?;
        if moved.is_empty() {
            return Ok(0);
        }
        let count = moved.len();
        let mut target = self.staged(to)?;
        target.extend(moved.into_iter().map(|mut e| {
            e.client_order_key = to.to_string();
            e
        }));
        self.write(CF_STAGED, to.as_bytes(), &target)?;
        Ok(count)
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut purged = 0;
        for (key, entries) in self.scan::<Vec<StagedPaymentEntry>>(CF_STAGED)? {
            let before = entries.len();
            let kept: Vec<_> = entries.into_iter().filter(|e| e.created_at >= cutoff).collect();
            purged += before - kept.len();
            if kept.is_empty() {
                self.db.delete_cf(self.cf(CF_STAGED)?, &key)?;
            } else if kept.len() != before {
                self.write(CF_STAGED, &key, &kept)?;
            }
        }
        Ok(purged)
    }

    async fn pending_keys(&self) -> Result<usize> {
        Ok(self.scan::<Vec<StagedPaymentEntry>>(CF_STAGED)?.len())
    }
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn insert(&self, payment: PaymentRecord) -> Result<()> {
        self.write(CF_PAYMENTS, &payment.id.to_be_bytes(), &payment)
    }

    async fn get(&self, id: PaymentId) -> Result<Option<PaymentRecord>> {
        self.read(CF_PAYMENTS, &id.to_be_bytes())
    }

    async fn for_order(&self, order_id: OrderId) -> Result<Vec<PaymentRecord>> {
        Ok(self
            .all_payments()
            .await?
            .into_iter()
            .filter(|p| p.order_id == order_id)
            .collect())
    }

    async fn annotate(&self, id: PaymentId, annotation: &PaymentAnnotation) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut payment: PaymentRecord = self
            .read(CF_PAYMENTS, &id.to_be_bytes())?
            .ok_or(PosError::PaymentNotFound(id))?;
        payment.annotate(annotation)?;
        self.write(CF_PAYMENTS, &id.to_be_bytes(), &payment)
    }

    async fn all_payments(&self) -> Result<Vec<PaymentRecord>> {
        // Big-endian keys iterate in id order.
        Ok(self
            .scan::<PaymentRecord>(CF_PAYMENTS)?
            .into_iter()
            .map(|(_, payment)| payment)
            .collect())
    }
}
