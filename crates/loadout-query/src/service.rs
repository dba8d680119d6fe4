//! Async lineage query service over a [`HistoryStore`]

use crate::{LineageStatistics, QueryConfig, QueryError};
use loadout_domain::traits::{HistoryStore, LineageQueryFilters};
use loadout_domain::{FieldHistory, LineageHistoryRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcome of a stored batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    /// Identifier for log correlation (UUIDv7, time-ordered)
    pub batch_id: Uuid,
    /// Records submitted
    pub submitted: usize,
    /// Records that were new to the store
    pub stored: usize,
    /// Records whose key was already present
    pub duplicates: usize,
}

/// Persists and queries lineage history records
///
/// The store is shared behind a mutex and every call runs on tokio's blocking
/// pool, bounded by [`QueryConfig::operation_timeout`]. A call that times out
/// may still complete in the background; retrying it is safe because stores
/// ignore keys they already hold.
///
/// Concurrent writers to the same (entity, field) must still serialize their
/// read-reconcile-write cycle themselves.
pub struct LineageQueryService<S> {
    store: Arc<Mutex<S>>,
    config: QueryConfig,
}

impl<S> Clone for LineageQueryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S> LineageQueryService<S>
where
    S: Send + 'static,
{
    /// Create a service that takes ownership of `store`
    pub fn new(store: S, config: QueryConfig) -> Result<Self, QueryError> {
        Self::with_shared_store(Arc::new(Mutex::new(store)), config)
    }

    /// Create a service over a store shared with other components
    pub fn with_shared_store(store: Arc<Mutex<S>>, config: QueryConfig) -> Result<Self, QueryError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Create a service with default configuration
    pub fn with_defaults(store: S) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            config: QueryConfig::default(),
        }
    }

    /// The active configuration
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Store a single history record
    ///
    /// Returns `false` if a record with the same key was already stored.
    pub async fn store_history_record<T>(&self, record: LineageHistoryRecord<T>) -> Result<bool, QueryError>
    where
        S: HistoryStore<T>,
        S::Error: Display,
        T: Send + 'static,
    {
        validate_record(&record, None)?;
        let key = record.key();

        let inserted = self
            .run_blocking("store_history_record", move |store| {
                store.insert_history(&record).map_err(persistence)
            })
            .await?;

        debug!(key = %key, inserted, "Stored history record");
        Ok(inserted)
    }

    /// Store a batch of history records, all or nothing
    ///
    /// Every record is validated before anything is written; the first
    /// invalid record rejects the whole batch and is named in the error.
    pub async fn batch_store_history<T>(&self, records: Vec<LineageHistoryRecord<T>>) -> Result<BatchReceipt, QueryError>
    where
        S: HistoryStore<T>,
        S::Error: Display,
        T: Send + 'static,
    {
        let batch_id = Uuid::now_v7();
        let submitted = records.len();

        if submitted > self.config.max_batch_size {
            warn!(%batch_id, submitted, max = self.config.max_batch_size, "Rejected oversized batch");
            return Err(QueryError::Validation {
                field: "records".to_string(),
                reason: format!(
                    "batch of {} exceeds max_batch_size {}",
                    submitted, self.config.max_batch_size
                ),
            });
        }

        for (index, record) in records.iter().enumerate() {
            if let Err(e) = validate_record(record, Some(index)) {
                warn!(%batch_id, error = %e, "Rejected invalid batch");
                return Err(e);
            }
        }

        let stored = if records.is_empty() {
            0
        } else {
            self.run_blocking("batch_store_history", move |store| {
                store.insert_history_batch(&records).map_err(persistence)
            })
            .await?
        };

        let receipt = BatchReceipt {
            batch_id,
            submitted,
            stored,
            duplicates: submitted - stored,
        };
        info!(
            batch_id = %receipt.batch_id,
            submitted = receipt.submitted,
            stored = receipt.stored,
            duplicates = receipt.duplicates,
            "Stored history batch"
        );
        Ok(receipt)
    }

    /// Query history records matching `filters`
    ///
    /// Results are ordered by timestamp, then weapon id, field and source name.
    pub async fn query_history<T>(&self, filters: LineageQueryFilters) -> Result<Vec<LineageHistoryRecord<T>>, QueryError>
    where
        S: HistoryStore<T>,
        S::Error: Display,
        T: Send + 'static,
    {
        filters.check().map_err(|(field, reason)| QueryError::Validation {
            field: field.to_string(),
            reason,
        })?;

        let records = self
            .run_blocking("query_history", move |store| {
                store.query_history(&filters).map_err(persistence)
            })
            .await?;

        debug!(count = records.len(), "Queried history");
        Ok(records)
    }

    /// The time-ordered history of one field
    pub async fn get_field_history<T>(&self, weapon_id: &str, field: &str) -> Result<FieldHistory<T>, QueryError>
    where
        S: HistoryStore<T>,
        S::Error: Display,
        T: Send + 'static,
    {
        let records = self
            .query_history(LineageQueryFilters::for_field(weapon_id, field))
            .await?;
        Ok(FieldHistory::from_records(weapon_id, field, records))
    }

    /// Histories of every field of one entity, keyed by field name
    pub async fn get_entity_history<T>(&self, weapon_id: &str) -> Result<BTreeMap<String, FieldHistory<T>>, QueryError>
    where
        S: HistoryStore<T>,
        S::Error: Display,
        T: Send + 'static,
    {
        let records = self
            .query_history(LineageQueryFilters::for_entity(weapon_id))
            .await?;

        let mut by_field: BTreeMap<String, Vec<LineageHistoryRecord<T>>> = BTreeMap::new();
        for record in records {
            by_field.entry(record.field.clone()).or_default().push(record);
        }

        Ok(by_field
            .into_iter()
            .map(|(field, records)| {
                let history = FieldHistory::from_records(weapon_id, &field, records);
                (field, history)
            })
            .collect())
    }

    /// Aggregate a supplied record set (no I/O)
    pub fn compute_statistics<T>(&self, records: &[LineageHistoryRecord<T>]) -> LineageStatistics {
        LineageStatistics::from_records(records)
    }

    /// Query with `filters` and aggregate the result
    pub async fn query_statistics<T>(&self, filters: LineageQueryFilters) -> Result<LineageStatistics, QueryError>
    where
        S: HistoryStore<T>,
        S::Error: Display,
        T: Send + 'static,
    {
        let records = self.query_history::<T>(filters).await?;
        Ok(self.compute_statistics(&records))
    }

    /// Run `operation` against the locked store on the blocking pool
    async fn run_blocking<R, F>(&self, operation: &'static str, f: F) -> Result<R, QueryError>
    where
        F: FnOnce(&mut S) -> Result<R, QueryError> + Send + 'static,
        R: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let limit = self.config.operation_timeout();

        let task = tokio::task::spawn_blocking(move || {
            let mut guard = store
                .lock()
                .map_err(|_| QueryError::Persistence("store lock poisoned".to_string()))?;
            f(&mut *guard)
        });

        match timeout(limit, task).await {
            Ok(joined) => {
                joined.map_err(|e| QueryError::Persistence(format!("Task join error: {}", e)))?
            }
            Err(_) => {
                warn!(operation, timeout_ms = self.config.operation_timeout_ms, "Store operation timed out");
                Err(QueryError::Timeout(limit))
            }
        }
    }
}

fn persistence<E: Display>(e: E) -> QueryError {
    QueryError::Persistence(e.to_string())
}

fn validate_record<T>(record: &LineageHistoryRecord<T>, position: Option<usize>) -> Result<(), QueryError> {
    record.check().map_err(|(name, reason)| QueryError::Validation {
        field: match position {
            Some(index) => format!("records[{}].{}", index, name),
            None => name.to_string(),
        },
        reason: format!("{} ({})", reason, record.key()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadout_domain::DataSource;

    fn record(confidence: f64) -> LineageHistoryRecord<i32> {
        LineageHistoryRecord::new(
            "ak-47".to_string(),
            "damage".to_string(),
            None,
            35,
            DataSource::OfficialApi,
            confidence,
            None,
            None,
            10,
        )
    }

    #[test]
    fn test_validate_record_names_position() {
        let err = validate_record(&record(1.5), Some(3)).unwrap_err();
        match err {
            QueryError::Validation { field, reason } => {
                assert_eq!(field, "records[3].confidence");
                assert!(reason.contains("ak-47/damage@10#official_api"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = validate_record(&record(-0.1), None).unwrap_err();
        assert!(matches!(err, QueryError::Validation { ref field, .. } if field == "confidence"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = QueryConfig {
            operation_timeout_ms: 0,
            ..Default::default()
        };
        assert!(LineageQueryService::new((), config).is_err());
    }
}
