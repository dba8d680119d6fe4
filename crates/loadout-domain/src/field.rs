//! Reconciled multi-source fields

use crate::{ConfidenceScore, DataSource, SourceRecord};

/// One `(source, value)` pair reported in a conflict
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConflictValue<T> {
    /// Source that reported the value
    pub source: DataSource,
    /// Reported value
    pub value: T,
}

/// Disagreement between sources on a field's current value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConflictDetail<T> {
    /// Field the sources disagree on
    pub field: String,
    /// Distinct `(source, value)` pairs, most reliable source first
    pub values: Vec<ConflictValue<T>>,
}

impl<T: PartialEq> ConflictDetail<T> {
    /// Number of distinct values among the reported pairs
    pub fn distinct_values(&self) -> usize {
        let mut seen: Vec<&T> = Vec::new();
        for entry in &self.values {
            if !seen.contains(&&entry.value) {
                seen.push(&entry.value);
            }
        }
        seen.len()
    }
}

/// The reconciled view of one field across every source that reported it
///
/// Built fresh by the reconciler on every call and never mutated in place:
/// an update produces a new field from the old sources plus the new record.
///
/// Invariants:
/// - `current_value` is the value of `primary_source`'s most recent record
/// - `has_conflict` is true iff `sources` hold at least two distinct values
/// - `sources` are in ranking order (reliability, recency, source order)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiSourceField<T> {
    /// Authoritative value
    pub current_value: T,

    /// Every observation considered, in ranking order
    pub sources: Vec<SourceRecord<T>>,

    /// Source whose record supplied `current_value`
    pub primary_source: DataSource,

    /// Composite confidence with its components
    pub confidence: ConfidenceScore,

    /// Whether sources disagree
    pub has_conflict: bool,

    /// Exactly one entry when `has_conflict`, empty otherwise
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub conflict_details: Vec<ConflictDetail<T>>,
}

impl<T> MultiSourceField<T> {
    /// The record that supplied `current_value`
    pub fn primary_record(&self) -> Option<&SourceRecord<T>> {
        self.sources
            .iter()
            .filter(|r| r.source == self.primary_source)
            .max_by_key(|r| r.timestamp)
    }

    /// The record contributed by `source`, if any (most recent first)
    pub fn record_from(&self, source: DataSource) -> Option<&SourceRecord<T>> {
        self.sources
            .iter()
            .filter(|r| r.source == source)
            .max_by_key(|r| r.timestamp)
    }
}

/// Type-erased view of a reconciled field, used for per-entity rollups
/// across fields of different value types
pub trait FieldLineage {
    /// Sources that contributed at least one record
    fn contributing_sources(&self) -> Vec<DataSource>;

    /// Confidence of the reconciled value
    fn confidence(&self) -> ConfidenceScore;

    /// Whether the sources disagree
    fn has_conflict(&self) -> bool;

    /// Timestamp of the newest observation (epoch millis)
    fn last_observed(&self) -> Option<u64>;
}

impl<T> FieldLineage for MultiSourceField<T> {
    fn contributing_sources(&self) -> Vec<DataSource> {
        let mut sources: Vec<DataSource> = self.sources.iter().map(|r| r.source).collect();
        sources.sort();
        sources.dedup();
        sources
    }

    fn confidence(&self) -> ConfidenceScore {
        self.confidence
    }

    fn has_conflict(&self) -> bool {
        self.has_conflict
    }

    fn last_observed(&self) -> Option<u64> {
        self.sources.iter().map(|r| r.timestamp).max()
    }
}
