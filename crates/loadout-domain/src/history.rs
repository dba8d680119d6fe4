//! Lineage history - the append-only audit log of value transitions

use crate::DataSource;
use std::fmt;

/// Content address of a history record
///
/// Two records with the same key describe the same transition; storing the
/// second is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HistoryKey {
    /// Entity the field belongs to
    pub weapon_id: String,
    /// Field name
    pub field: String,
    /// When the transition was recorded (epoch millis)
    pub timestamp: u64,
    /// Source that caused the transition
    pub source: DataSource,
}

impl fmt::Display for HistoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}@{}#{}",
            self.weapon_id, self.field, self.timestamp, self.source
        )
    }
}

/// An immutable audit entry describing one value transition
///
/// `old_value == None` marks the first observation of the (entity, field).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineageHistoryRecord<T> {
    /// Entity the field belongs to
    pub weapon_id: String,

    /// Field name
    pub field: String,

    /// Value before the transition
    pub old_value: Option<T>,

    /// Value after the transition
    pub new_value: T,

    /// Source responsible for the new value
    pub source: DataSource,

    /// Confidence of the new value [0.0, 1.0]
    pub confidence: f64,

    /// Why the value changed (e.g. "patch", "correction")
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub reason: Option<String>,

    /// Link to supporting material
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub reference: Option<String>,

    /// When the transition was recorded (epoch millis)
    pub timestamp: u64,
}

impl<T> LineageHistoryRecord<T> {
    /// Create a new history record
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        weapon_id: String,
        field: String,
        old_value: Option<T>,
        new_value: T,
        source: DataSource,
        confidence: f64,
        reason: Option<String>,
        reference: Option<String>,
        timestamp: u64,
    ) -> Self {
        Self {
            weapon_id,
            field,
            old_value,
            new_value,
            source,
            confidence,
            reason,
            reference,
            timestamp,
        }
    }

    /// The record's content address
    pub fn key(&self) -> HistoryKey {
        HistoryKey {
            weapon_id: self.weapon_id.clone(),
            field: self.field.clone(),
            timestamp: self.timestamp,
            source: self.source,
        }
    }

    /// Whether this is the first-ever observation of the field
    pub fn is_initial(&self) -> bool {
        self.old_value.is_none()
    }

    /// Check the record's own invariants, returning the offending field name
    /// and a description on failure
    pub fn check(&self) -> Result<(), (&'static str, String)> {
        if self.weapon_id.trim().is_empty() {
            return Err(("weapon_id", "must not be empty".to_string()));
        }
        if self.field.trim().is_empty() {
            return Err(("field", "must not be empty".to_string()));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err((
                "confidence",
                format!("{} is outside [0.0, 1.0]", self.confidence),
            ));
        }
        Ok(())
    }
}

/// One step in a field's history
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldHistoryEntry<T> {
    /// When the transition was recorded (epoch millis)
    pub timestamp: u64,
    /// Value before the transition
    pub old_value: Option<T>,
    /// Value after the transition
    pub new_value: T,
    /// Source responsible
    pub source: DataSource,
    /// Confidence of the new value
    pub confidence: f64,
    /// Why the value changed
    pub reason: Option<String>,
    /// Supporting reference
    pub reference: Option<String>,
}

/// Time-ordered history of one (entity, field) pair
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldHistory<T> {
    /// Entity the field belongs to
    pub weapon_id: String,
    /// Field name
    pub field: String,
    /// Transitions, oldest first
    pub entries: Vec<FieldHistoryEntry<T>>,
}

impl<T> FieldHistory<T> {
    /// Project history records onto one (entity, field) pair
    ///
    /// Records for other pairs are ignored; entries are sorted by timestamp,
    /// then by source order.
    pub fn from_records<I>(weapon_id: &str, field: &str, records: I) -> Self
    where
        I: IntoIterator<Item = LineageHistoryRecord<T>>,
    {
        let mut entries: Vec<FieldHistoryEntry<T>> = records
            .into_iter()
            .filter(|r| r.weapon_id == weapon_id && r.field == field)
            .map(|r| FieldHistoryEntry {
                timestamp: r.timestamp,
                old_value: r.old_value,
                new_value: r.new_value,
                source: r.source,
                confidence: r.confidence,
                reason: r.reason,
                reference: r.reference,
            })
            .collect();
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.source.cmp(&b.source)));

        Self {
            weapon_id: weapon_id.to_string(),
            field: field.to_string(),
            entries,
        }
    }

    /// Most recent value, if any transition was recorded
    pub fn latest(&self) -> Option<&T> {
        self.entries.last().map(|e| &e.new_value)
    }

    /// Number of recorded transitions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no transitions were recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rollup of every reconciled field of one entity
///
/// Derived and recomputable at any time; never a source of truth.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineageMetadata {
    /// Number of distinct contributing sources
    pub total_sources: usize,
    /// Mean composite confidence across fields
    pub average_confidence: f64,
    /// Fields whose sources disagree
    pub conflict_count: usize,
    /// Fields whose primary observation has decayed below the stale threshold
    pub stale_data_count: usize,
    /// Newest observation across all fields (epoch millis)
    pub last_updated: Option<u64>,
    /// When this rollup was computed (epoch millis)
    pub last_validated: u64,
    /// Distinct contributing sources in source order
    pub contributing_sources: Vec<DataSource>,
}
