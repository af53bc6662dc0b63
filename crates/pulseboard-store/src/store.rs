//! MetricStore — redb-backed persistence for metric events.
//!
//! Provides insert, newest-first listing, and delete-by-id. Records are
//! never updated in place. The store supports both on-disk and in-memory
//! backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::tables::*;
use crate::types::*;

/// Maximum number of records returned by a listing.
pub const DEFAULT_LIMIT: usize = 100;

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

/// Thread-safe metric store backed by redb.
#[derive(Clone)]
pub struct MetricStore {
    db: Arc<Database>,
}

impl MetricStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "metric store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory metric store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(METRICS).map_err(map_err!(Table))?;
        txn.open_table(METRIC_IDS).map_err(map_err!(Table))?;
        txn.open_table(META).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Persist a new metric, assigning its id and (if absent) timestamp.
    pub fn insert(&self, new: NewMetric) -> StoreResult<Metric> {
        new.validate()?;
        let timestamp = new.timestamp.unwrap_or_else(Utc::now);

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let metric;
        {
            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            let sequence = meta
                .get(SEQUENCE_KEY)
                .map_err(map_err!(Read))?
                .map(|guard| guard.value())
                .unwrap_or(0)
                + 1;
            meta.insert(SEQUENCE_KEY, sequence)
                .map_err(map_err!(Write))?;

            let mut ids = txn.open_table(METRIC_IDS).map_err(map_err!(Table))?;
            let mut id = generate_id(&timestamp);
            while ids.get(id.as_str()).map_err(map_err!(Read))?.is_some() {
                id = generate_id(&timestamp);
            }

            metric = Metric {
                id,
                kind: new.kind,
                value: new.value,
                timestamp,
                data: new.data,
            };
            let key = order_key(timestamp.timestamp_micros(), sequence);
            let value = serde_json::to_vec(&metric).map_err(map_err!(Serialize))?;

            ids.insert(metric.id.as_str(), key.as_str())
                .map_err(map_err!(Write))?;
            let mut table = txn.open_table(METRICS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = %metric.id, kind = %metric.kind, "metric stored");
        Ok(metric)
    }

    /// List up to `limit` records, newest first.
    pub fn list_recent(&self, limit: usize) -> StoreResult<Vec<Metric>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(METRICS).map_err(map_err!(Table))?;
        let mut results = Vec::with_capacity(limit.min(DEFAULT_LIMIT));
        for entry in table.iter().map_err(map_err!(Read))?.rev().take(limit) {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let metric: Metric =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(metric);
        }
        Ok(results)
    }

    /// Get a single record by id.
    pub fn get(&self, id: &str) -> StoreResult<Option<Metric>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let ids = txn.open_table(METRIC_IDS).map_err(map_err!(Table))?;
        let key = match ids.get(id).map_err(map_err!(Read))? {
            Some(guard) => guard.value().to_string(),
            None => return Ok(None),
        };
        let table = txn.open_table(METRICS).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let metric: Metric =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(metric))
            }
            None => Ok(None),
        }
    }

    /// Delete a record by id. Returns true if it existed.
    pub fn delete_by_id(&self, id: &str) -> StoreResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut ids = txn.open_table(METRIC_IDS).map_err(map_err!(Table))?;
            let key = ids
                .remove(id)
                .map_err(map_err!(Write))?
                .map(|guard| guard.value().to_string());
            existed = match key {
                Some(key) => {
                    let mut table = txn.open_table(METRICS).map_err(map_err!(Table))?;
                    table.remove(key.as_str()).map_err(map_err!(Write))?;
                    true
                }
                None => false,
            };
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%id, existed, "metric deleted");
        Ok(existed)
    }

    /// Total number of stored records.
    pub fn count(&self) -> StoreResult<u64> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(METRIC_IDS).map_err(map_err!(Table))?;
        table.len().map_err(map_err!(Read))
    }
}
