//! In-memory history store

use crate::StoreError;
use loadout_domain::traits::{HistoryStore, LineageQueryFilters};
use loadout_domain::{HistoryKey, LineageHistoryRecord};
use std::collections::BTreeMap;

/// Volatile [`HistoryStore`] keyed by [`HistoryKey`]
///
/// Used in tests and for dry runs. Holds values in their native type, so no
/// serialization bounds apply.
#[derive(Debug, Clone)]
pub struct MemoryHistoryStore<T> {
    records: BTreeMap<HistoryKey, LineageHistoryRecord<T>>,
}

impl<T> MemoryHistoryStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been stored
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T> Default for MemoryHistoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> HistoryStore<T> for MemoryHistoryStore<T> {
    type Error = StoreError;

    fn insert_history(&mut self, record: &LineageHistoryRecord<T>) -> Result<bool, Self::Error> {
        let key = record.key();
        if self.records.contains_key(&key) {
            return Ok(false);
        }
        self.records.insert(key, record.clone());
        Ok(true)
    }

    fn insert_history_batch(&mut self, records: &[LineageHistoryRecord<T>]) -> Result<usize, Self::Error> {
        let mut inserted = 0;
        for record in records {
            if self.insert_history(record)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn query_history(&self, filters: &LineageQueryFilters) -> Result<Vec<LineageHistoryRecord<T>>, Self::Error> {
        let mut matching: Vec<&LineageHistoryRecord<T>> =
            self.records.values().filter(|r| filters.matches(r)).collect();

        // Same order as the SQLite store: source name, not declaration order
        matching.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.weapon_id.cmp(&b.weapon_id))
                .then_with(|| a.field.cmp(&b.field))
                .then_with(|| a.source.as_str().cmp(b.source.as_str()))
        });

        let limit = filters.limit.unwrap_or(usize::MAX);
        Ok(matching.into_iter().take(limit).cloned().collect())
    }
}
