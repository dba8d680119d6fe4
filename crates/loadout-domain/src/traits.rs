//! Trait definitions for external interactions
//!
//! These traits define the boundary between the reconciliation core and
//! persistence. Implementations live in other crates.

use crate::{DataSource, LineageHistoryRecord};

/// Append-only storage of lineage history records
///
/// Records are keyed by `(weapon_id, field, timestamp, source)`. Inserting a
/// key that already exists must leave the stored record untouched and report
/// it as a duplicate, so whole-batch retries are safe.
///
/// Implemented by the infrastructure layer (loadout-store)
pub trait HistoryStore<T> {
    /// Error type for store operations
    type Error;

    /// Insert one record; returns `false` if the key was already present
    fn insert_history(&mut self, record: &LineageHistoryRecord<T>) -> Result<bool, Self::Error>;

    /// Insert a batch atomically; returns how many records were new
    ///
    /// Either every record is stored or none is.
    fn insert_history_batch(&mut self, records: &[LineageHistoryRecord<T>]) -> Result<usize, Self::Error>;

    /// Query records matching `filters`, ordered by timestamp, then weapon id,
    /// field and source name
    fn query_history(&self, filters: &LineageQueryFilters) -> Result<Vec<LineageHistoryRecord<T>>, Self::Error>;
}

/// Query criteria for retrieving history records
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineageQueryFilters {
    /// Filter by entity
    pub weapon_id: Option<String>,

    /// Filter by field name
    pub field: Option<String>,

    /// Filter by source
    pub source: Option<DataSource>,

    /// Earliest timestamp (inclusive, epoch millis)
    pub start_time: Option<u64>,

    /// Latest timestamp (inclusive, epoch millis)
    pub end_time: Option<u64>,

    /// Filter by minimum confidence
    pub min_confidence: Option<f64>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

impl LineageQueryFilters {
    /// Filters selecting one (entity, field) pair
    pub fn for_field(weapon_id: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            weapon_id: Some(weapon_id.into()),
            field: Some(field.into()),
            ..Default::default()
        }
    }

    /// Filters selecting every field of one entity
    pub fn for_entity(weapon_id: impl Into<String>) -> Self {
        Self {
            weapon_id: Some(weapon_id.into()),
            ..Default::default()
        }
    }

    /// Whether a record passes every predicate (ignores `limit`)
    pub fn matches<T>(&self, record: &LineageHistoryRecord<T>) -> bool {
        self.weapon_id.as_ref().is_none_or(|id| *id == record.weapon_id)
            && self.field.as_ref().is_none_or(|f| *f == record.field)
            && self.source.is_none_or(|s| s == record.source)
            && self.start_time.is_none_or(|start| record.timestamp >= start)
            && self.end_time.is_none_or(|end| record.timestamp <= end)
            && self.min_confidence.is_none_or(|min| record.confidence >= min)
    }

    /// Check the filters themselves, returning the offending filter name
    /// and a description on failure
    pub fn check(&self) -> Result<(), (&'static str, String)> {
        if let Some(min) = self.min_confidence {
            if !min.is_finite() || !(0.0..=1.0).contains(&min) {
                return Err(("min_confidence", format!("{} is outside [0.0, 1.0]", min)));
            }
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start > end {
                return Err((
                    "start_time",
                    format!("start {} is after end {}", start, end),
                ));
            }
        }
        if self.limit == Some(0) {
            return Err(("limit", "must be greater than zero".to_string()));
        }
        Ok(())
    }
}
