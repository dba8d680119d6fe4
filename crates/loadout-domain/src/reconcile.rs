//! Field reconciliation
//!
//! Merges every observation of one field into a single [`MultiSourceField`]:
//! 1. Rank records by reliability, then recency, then source order
//! 2. Take the top-ranked record as primary and its value as current
//! 3. Group records by value to detect conflicts
//! 4. Score the result with [`crate::confidence_computation`]
//!
//! Ranking is a total order over valid inputs, so the result does not depend
//! on the order in which records are supplied.

use crate::clock::now_millis;
use crate::confidence_computation::{score_primary, ConfidenceConfig};
use crate::error::{LineageError, Result};
use crate::{ConflictDetail, ConflictValue, MultiSourceField, SourceRecord, SourceRegistry};
use std::cmp::Ordering;

/// Value equality used for conflict detection and change detection
///
/// Structural equality via `PartialEq`: primitive equality for scalars,
/// deep equality for composite values.
pub fn values_equal<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

/// Reconciles observations of a single field
///
/// Holds the injected reliability table and confidence parameters. Cheap to
/// clone and free of shared mutable state, so one instance may serve
/// concurrent calls for different entities and fields.
#[derive(Debug, Clone)]
pub struct FieldReconciler {
    registry: SourceRegistry,
    config: ConfidenceConfig,
}

impl FieldReconciler {
    /// Create a reconciler, validating the confidence parameters
    pub fn new(registry: SourceRegistry, config: ConfidenceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { registry, config })
    }

    /// The active reliability table
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// The active confidence parameters
    pub fn config(&self) -> &ConfidenceConfig {
        &self.config
    }

    /// Reconcile `records` for `field`, scoring freshness against the wall clock
    pub fn reconcile<T>(&self, records: &[SourceRecord<T>], field: &str) -> Result<MultiSourceField<T>>
    where
        T: Clone + PartialEq,
    {
        self.reconcile_at(records, field, now_millis())
    }

    /// Reconcile `records` for `field` as of `now` (epoch millis)
    ///
    /// # Errors
    /// - [`LineageError::EmptySourceSet`] if `records` is empty
    /// - [`LineageError::UnknownSource`] if a record's source is unregistered
    /// - [`LineageError::AmbiguousObservation`] if one source reports two
    ///   different values with the same timestamp
    pub fn reconcile_at<T>(
        &self,
        records: &[SourceRecord<T>],
        field: &str,
        now: u64,
    ) -> Result<MultiSourceField<T>>
    where
        T: Clone + PartialEq,
    {
        if records.is_empty() {
            return Err(LineageError::EmptySourceSet {
                field: field.to_string(),
            });
        }

        let ranked = self.rank(records, field)?;
        let sources: Vec<SourceRecord<T>> = ranked.iter().map(|(_, r)| (*r).clone()).collect();

        let primary = &sources[0];
        let current_value = primary.value.clone();
        let primary_source = primary.source;

        let confidence = score_primary(&sources, 0, now, &self.registry, &self.config)?;

        let detail = ConflictDetail {
            field: field.to_string(),
            values: distinct_pairs(&sources),
        };
        let has_conflict = detail.distinct_values() > 1;
        let conflict_details = if has_conflict { vec![detail] } else { Vec::new() };

        Ok(MultiSourceField {
            current_value,
            sources,
            primary_source,
            confidence,
            has_conflict,
            conflict_details,
        })
    }

    /// Sort records into ranking order, rejecting ambiguous duplicates
    fn rank<'a, T: PartialEq>(
        &self,
        records: &'a [SourceRecord<T>],
        field: &str,
    ) -> Result<Vec<(f64, &'a SourceRecord<T>)>> {
        let mut ranked = records
            .iter()
            .map(|r| Ok((self.registry.reliability(r.source)?, r)))
            .collect::<Result<Vec<_>>>()?;

        ranked.sort_by(|(rel_a, a), (rel_b, b)| compare_rank(*rel_a, a, *rel_b, b));

        // Records from one source at one instant are adjacent after sorting
        for pair in ranked.windows(2) {
            let (a, b) = (pair[0].1, pair[1].1);
            if a.source == b.source && a.timestamp == b.timestamp && a.value != b.value {
                return Err(LineageError::AmbiguousObservation {
                    field: field.to_string(),
                    data_source: a.source,
                    timestamp: a.timestamp,
                });
            }
        }

        Ok(ranked)
    }
}

impl Default for FieldReconciler {
    fn default() -> Self {
        Self {
            registry: SourceRegistry::standard(),
            config: ConfidenceConfig::default(),
        }
    }
}

/// Reliability desc, then timestamp desc, then source declaration order
fn compare_rank<T>(rel_a: f64, a: &SourceRecord<T>, rel_b: f64, b: &SourceRecord<T>) -> Ordering {
    rel_b
        .total_cmp(&rel_a)
        .then_with(|| b.timestamp.cmp(&a.timestamp))
        .then_with(|| a.source.cmp(&b.source))
}

/// Distinct `(source, value)` pairs in ranking order
fn distinct_pairs<T: Clone + PartialEq>(sources: &[SourceRecord<T>]) -> Vec<ConflictValue<T>> {
    let mut pairs: Vec<ConflictValue<T>> = Vec::new();
    for record in sources {
        let seen = pairs
            .iter()
            .any(|p| p.source == record.source && values_equal(&p.value, &record.value));
        if !seen {
            pairs.push(ConflictValue {
                source: record.source,
                value: record.value.clone(),
            });
        }
    }
    pairs
}
