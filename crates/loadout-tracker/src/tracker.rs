//! Core lineage tracker: reconciliation entry points and history records

use crate::error::{Result, TrackerError};
use crate::TrackerConfig;
use loadout_domain::clock::now_millis;
use loadout_domain::{
    values_equal, DataSource, FieldLineage, FieldReconciler, LineageError, LineageHistoryRecord,
    LineageMetadata, MultiSourceField, SourceRecord,
};
use tracing::debug;

/// Orchestrates reconciliation and history-record creation
///
/// Every operation is pure and in-memory. The tracker never decides on its
/// own that a value changed or persists anything; callers compare values with
/// [`LineageTracker::values_equal`] (or use [`LineageTracker::record_change`])
/// and hand the resulting records to the query service.
///
/// # Examples
///
/// ```
/// use loadout_domain::{DataSource, SourceRecord};
/// use loadout_tracker::LineageTracker;
///
/// let tracker = LineageTracker::default_config();
/// let field = tracker
///     .create_multi_source_field_at(vec![SourceRecord::new(DataSource::PatchNotes, 35, 0)], "damage", 0)
///     .unwrap();
///
/// let updated = tracker
///     .add_or_update_source_at(&field, SourceRecord::new(DataSource::OfficialApi, 36, 10), "damage", 10)
///     .unwrap();
///
/// assert!(!tracker.values_equal(&field.current_value, &updated.current_value));
/// ```
#[derive(Debug, Clone)]
pub struct LineageTracker {
    reconciler: FieldReconciler,
    stale_freshness_threshold: f64,
}

impl LineageTracker {
    /// Create a tracker from a validated configuration
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            reconciler: config.reconciler()?,
            stale_freshness_threshold: config.stale_freshness_threshold,
        })
    }

    /// Create a tracker with the standard table and default parameters
    pub fn default_config() -> Self {
        Self {
            reconciler: FieldReconciler::default(),
            stale_freshness_threshold: TrackerConfig::default().stale_freshness_threshold,
        }
    }

    /// The underlying reconciler
    pub fn reconciler(&self) -> &FieldReconciler {
        &self.reconciler
    }

    /// Reconcile a field from scratch (no prior state)
    pub fn create_multi_source_field<T>(
        &self,
        records: Vec<SourceRecord<T>>,
        field: &str,
    ) -> Result<MultiSourceField<T>>
    where
        T: Clone + PartialEq,
    {
        self.create_multi_source_field_at(records, field, now_millis())
    }

    /// Reconcile a field from scratch as of `now`
    pub fn create_multi_source_field_at<T>(
        &self,
        records: Vec<SourceRecord<T>>,
        field: &str,
        now: u64,
    ) -> Result<MultiSourceField<T>>
    where
        T: Clone + PartialEq,
    {
        let reconciled = self.reconciler.reconcile_at(&records, field, now)?;
        debug!(
            field,
            primary = %reconciled.primary_source,
            sources = reconciled.sources.len(),
            has_conflict = reconciled.has_conflict,
            confidence = reconciled.confidence.value,
            "Reconciled field"
        );
        Ok(reconciled)
    }

    /// Merge one new observation into an existing reconciled field
    pub fn add_or_update_source<T>(
        &self,
        existing: &MultiSourceField<T>,
        new_record: SourceRecord<T>,
        field: &str,
    ) -> Result<MultiSourceField<T>>
    where
        T: Clone + PartialEq,
    {
        self.add_or_update_source_at(existing, new_record, field, now_millis())
    }

    /// Merge one new observation into an existing reconciled field as of `now`
    ///
    /// A source contributes at most one observation per field, so a record
    /// from a source already present supersedes that source's record, while
    /// a record from a new source is appended. A record older than the one it
    /// would supersede is ignored. The field is then reconciled again from
    /// the complete record set.
    ///
    /// # Errors
    /// - [`LineageError::InvalidFieldState`] if `existing` has no sources or
    ///   no record from its own primary source
    /// - [`LineageError::AmbiguousObservation`] if the source's held record
    ///   has the same timestamp as `new_record` but a different value
    pub fn add_or_update_source_at<T>(
        &self,
        existing: &MultiSourceField<T>,
        new_record: SourceRecord<T>,
        field: &str,
        now: u64,
    ) -> Result<MultiSourceField<T>>
    where
        T: Clone + PartialEq,
    {
        check_field_state(existing, field)?;

        let held = existing.record_from(new_record.source);
        if let Some(held) = held {
            if held.timestamp == new_record.timestamp && held.value != new_record.value {
                return Err(TrackerError::Lineage(LineageError::AmbiguousObservation {
                    field: field.to_string(),
                    data_source: new_record.source,
                    timestamp: new_record.timestamp,
                }));
            }
        }

        let superseded = held.map(|r| r.timestamp);
        let mut records: Vec<SourceRecord<T>> = match superseded {
            Some(previous) if previous > new_record.timestamp => {
                debug!(
                    field,
                    source = %new_record.source,
                    previous,
                    incoming = new_record.timestamp,
                    "Ignoring observation older than the source's current record"
                );
                existing.sources.clone()
            }
            Some(_) => {
                debug!(field, source = %new_record.source, "Superseding source record");
                let mut kept: Vec<SourceRecord<T>> = existing
                    .sources
                    .iter()
                    .filter(|r| r.source != new_record.source)
                    .cloned()
                    .collect();
                kept.push(new_record);
                kept
            }
            None => {
                debug!(field, source = %new_record.source, "Appending source record");
                let mut all = existing.sources.clone();
                all.push(new_record);
                all
            }
        };
        records.shrink_to_fit();

        self.create_multi_source_field_at(records, field, now)
    }

    /// Build an audit record for a value transition, stamped with the current time
    #[allow(clippy::too_many_arguments)]
    pub fn create_history_record<T>(
        &self,
        weapon_id: &str,
        field: &str,
        old_value: Option<T>,
        new_value: T,
        source: DataSource,
        confidence: f64,
        reason: Option<String>,
        reference: Option<String>,
    ) -> LineageHistoryRecord<T> {
        self.create_history_record_at(
            weapon_id,
            field,
            old_value,
            new_value,
            source,
            confidence,
            reason,
            reference,
            now_millis(),
        )
    }

    /// Build an audit record for a value transition with an explicit timestamp
    #[allow(clippy::too_many_arguments)]
    pub fn create_history_record_at<T>(
        &self,
        weapon_id: &str,
        field: &str,
        old_value: Option<T>,
        new_value: T,
        source: DataSource,
        confidence: f64,
        reason: Option<String>,
        reference: Option<String>,
        timestamp: u64,
    ) -> LineageHistoryRecord<T> {
        LineageHistoryRecord::new(
            weapon_id.to_string(),
            field.to_string(),
            old_value,
            new_value,
            source,
            confidence,
            reason,
            reference,
            timestamp,
        )
    }

    /// The value-equality rule used by the reconciler
    pub fn values_equal<T: PartialEq>(&self, a: &T, b: &T) -> bool {
        values_equal(a, b)
    }

    /// Compare a field before and after an update and build the history
    /// record for the transition, if there was one
    ///
    /// `previous == None` means the field had never been observed, which
    /// always yields a record with `old_value == None`. The record carries the
    /// updated primary source and confidence, and is stamped with `timestamp`.
    #[allow(clippy::too_many_arguments)]
    pub fn record_change<T>(
        &self,
        weapon_id: &str,
        field: &str,
        previous: Option<&MultiSourceField<T>>,
        updated: &MultiSourceField<T>,
        reason: Option<String>,
        reference: Option<String>,
        timestamp: u64,
    ) -> Option<LineageHistoryRecord<T>>
    where
        T: Clone + PartialEq,
    {
        let old_value = match previous {
            Some(prev) if self.values_equal(&prev.current_value, &updated.current_value) => {
                return None;
            }
            Some(prev) => Some(prev.current_value.clone()),
            None => None,
        };

        debug!(weapon_id, field, source = %updated.primary_source, "Value transition detected");
        Some(self.create_history_record_at(
            weapon_id,
            field,
            old_value,
            updated.current_value.clone(),
            updated.primary_source,
            updated.confidence.value,
            reason,
            reference,
            timestamp,
        ))
    }

    /// Roll up every reconciled field of one entity
    ///
    /// Fields may carry different value types. An empty slice yields zero
    /// counts, a zero average and no `last_updated`.
    pub fn compute_metadata(&self, fields: &[&dyn FieldLineage], now: u64) -> LineageMetadata {
        let mut contributing: Vec<DataSource> = fields
            .iter()
            .flat_map(|f| f.contributing_sources())
            .collect();
        contributing.sort();
        contributing.dedup();

        let average_confidence = if fields.is_empty() {
            0.0
        } else {
            fields.iter().map(|f| f.confidence().value).sum::<f64>() / fields.len() as f64
        };

        LineageMetadata {
            total_sources: contributing.len(),
            average_confidence,
            conflict_count: fields.iter().filter(|f| f.has_conflict()).count(),
            stale_data_count: fields
                .iter()
                .filter(|f| f.confidence().is_stale(self.stale_freshness_threshold))
                .count(),
            last_updated: fields.iter().filter_map(|f| f.last_observed()).max(),
            last_validated: now,
            contributing_sources: contributing,
        }
    }
}

impl Default for LineageTracker {
    fn default() -> Self {
        Self::default_config()
    }
}

fn check_field_state<T>(existing: &MultiSourceField<T>, field: &str) -> Result<()> {
    if existing.sources.is_empty() {
        return Err(TrackerError::Lineage(LineageError::InvalidFieldState {
            field: field.to_string(),
            reason: "existing field has no sources".to_string(),
        }));
    }
    if existing.primary_record().is_none() {
        return Err(TrackerError::Lineage(LineageError::InvalidFieldState {
            field: field.to_string(),
            reason: format!(
                "primary source '{}' has no record among the sources",
                existing.primary_source
            ),
        }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadout_domain::{ConfidenceScore, SourceRegistry};

    const HOUR: u64 = 3_600_000;
    const DAY: u64 = 24 * HOUR;
    const T: u64 = 1_700_000_000_000;

    const A: DataSource = DataSource::OfficialApi;
    const B: DataSource = DataSource::CommunityAnalytics;
    const C: DataSource = DataSource::UserSubmission;

    fn example_tracker() -> LineageTracker {
        let mut config = TrackerConfig::default();
        config.reliability.insert("official_api".to_string(), 0.9);
        config.reliability.insert("community_analytics".to_string(), 0.6);
        config.reliability.insert("user_submission".to_string(), 0.3);
        LineageTracker::new(config).unwrap()
    }

    fn example_field(tracker: &LineageTracker) -> MultiSourceField<i32> {
        tracker
            .create_multi_source_field_at(
                vec![
                    SourceRecord::new(A, 35, T),
                    SourceRecord::new(B, 34, T - 2 * HOUR),
                    SourceRecord::new(C, 35, T - DAY),
                ],
                "damage",
                T,
            )
            .unwrap()
    }

    #[test]
    fn test_create_delegates_to_reconciler() {
        let tracker = example_tracker();
        let field = example_field(&tracker);
        let direct = tracker
            .reconciler()
            .reconcile_at(&field.sources, "damage", T)
            .unwrap();
        assert_eq!(field, direct);
        assert_eq!(field.current_value, 35);
        assert!(field.has_conflict);
    }

    #[test]
    fn test_update_scenario_produces_history_record() {
        let tracker = example_tracker();
        let existing = example_field(&tracker);

        let updated = tracker
            .add_or_update_source_at(&existing, SourceRecord::new(A, 36, T + HOUR), "damage", T + HOUR)
            .unwrap();

        assert_eq!(updated.primary_source, A);
        assert_eq!(updated.current_value, 36);
        assert_eq!(updated.sources.len(), 3, "A's record is superseded, not appended");
        assert!(!tracker.values_equal(&existing.current_value, &updated.current_value));

        let record = tracker
            .record_change("ak-47", "damage", Some(&existing), &updated, None, None, T + HOUR)
            .unwrap();
        assert_eq!(record.old_value, Some(35));
        assert_eq!(record.new_value, 36);
        assert_eq!(record.source, A);
        assert_eq!(record.confidence, updated.confidence.value);
        assert_eq!(record.timestamp, T + HOUR);
    }

    #[test]
    fn test_append_new_source() {
        let tracker = example_tracker();
        let existing = tracker
            .create_multi_source_field_at(vec![SourceRecord::new(C, 10, T)], "range", T)
            .unwrap();

        let updated = tracker
            .add_or_update_source_at(&existing, SourceRecord::new(B, 12, T), "range", T)
            .unwrap();
        assert_eq!(updated.sources.len(), 2);
        assert_eq!(updated.primary_source, B);
        assert!(updated.has_conflict);
    }

    #[test]
    fn test_older_record_does_not_supersede() {
        let tracker = example_tracker();
        let existing = example_field(&tracker);

        let updated = tracker
            .add_or_update_source_at(&existing, SourceRecord::new(A, 99, T - DAY), "damage", T)
            .unwrap();
        assert_eq!(updated.current_value, 35);
        assert_eq!(updated, existing);
    }

    #[test]
    fn test_same_instant_different_value_rejected() {
        let tracker = example_tracker();
        let existing = example_field(&tracker);

        let err = tracker
            .add_or_update_source_at(&existing, SourceRecord::new(A, 36, T), "damage", T)
            .unwrap_err();
        assert_eq!(
            err.as_lineage(),
            Some(&LineageError::AmbiguousObservation {
                field: "damage".to_string(),
                data_source: A,
                timestamp: T,
            })
        );

        // Cold start on the same pair of records fails the same way
        let cold = tracker
            .create_multi_source_field_at(vec![SourceRecord::new(A, 35, T), SourceRecord::new(A, 36, T)], "damage", T)
            .unwrap_err();
        assert_eq!(cold.as_lineage(), err.as_lineage());
    }

    #[test]
    fn test_same_instant_same_value_accepted() {
        let tracker = example_tracker();
        let existing = example_field(&tracker);

        let updated = tracker
            .add_or_update_source_at(
                &existing,
                SourceRecord::new(A, 35, T).with_reference("patch-1.2"),
                "damage",
                T,
            )
            .unwrap();
        assert_eq!(updated.current_value, 35);
        assert_eq!(
            updated.record_from(A).and_then(|r| r.reference.as_deref()),
            Some("patch-1.2")
        );
    }

    #[test]
    fn test_unchanged_value_yields_no_record() {
        let tracker = example_tracker();
        let existing = example_field(&tracker);

        let updated = tracker
            .add_or_update_source_at(&existing, SourceRecord::new(B, 35, T), "damage", T)
            .unwrap();
        assert!(!updated.has_conflict);
        assert!(tracker
            .record_change("ak-47", "damage", Some(&existing), &updated, None, None, T)
            .is_none());
    }

    #[test]
    fn test_first_observation_record() {
        let tracker = example_tracker();
        let field = example_field(&tracker);
        let record = tracker
            .record_change(
                "ak-47",
                "damage",
                None,
                &field,
                Some("initial import".to_string()),
                Some("https://example.com/ak".to_string()),
                T,
            )
            .unwrap();
        assert!(record.is_initial());
        assert_eq!(record.reason.as_deref(), Some("initial import"));
    }

    #[test]
    fn test_invalid_existing_state() {
        let tracker = example_tracker();
        let mut broken = example_field(&tracker);
        broken.sources.clear();

        let err = tracker
            .add_or_update_source_at(&broken, SourceRecord::new(A, 1, T), "damage", T)
            .unwrap_err();
        assert!(matches!(
            err.as_lineage(),
            Some(LineageError::InvalidFieldState { .. })
        ));

        let mut orphaned = example_field(&tracker);
        orphaned.primary_source = DataSource::Curator;
        assert!(tracker
            .add_or_update_source_at(&orphaned, SourceRecord::new(A, 1, T), "damage", T)
            .is_err());
    }

    #[test]
    fn test_create_history_record_stamps_time() {
        let tracker = LineageTracker::default_config();
        let before = now_millis();
        let record = tracker.create_history_record(
            "ak-47",
            "damage",
            Some(35),
            36,
            A,
            0.8,
            Some("patch".to_string()),
            None,
        );
        assert!(record.timestamp >= before);
        assert_eq!(record.weapon_id, "ak-47");
        assert_eq!(record.reason.as_deref(), Some("patch"));
    }

    #[test]
    fn test_metadata_rollup() {
        let tracker = example_tracker();
        let damage = example_field(&tracker);
        let stale_range = tracker
            .create_multi_source_field_at(vec![SourceRecord::new(B, 50.0, T - 200 * DAY)], "range", T)
            .unwrap();

        let fields: Vec<&dyn FieldLineage> = vec![&damage, &stale_range];
        let metadata = tracker.compute_metadata(&fields, T + 1);

        assert_eq!(metadata.total_sources, 3);
        assert_eq!(metadata.contributing_sources, vec![A, B, C]);
        assert_eq!(metadata.conflict_count, 1);
        assert_eq!(metadata.stale_data_count, 1);
        assert_eq!(metadata.last_updated, Some(T));
        assert_eq!(metadata.last_validated, T + 1);
        let expected = (damage.confidence.value + stale_range.confidence.value) / 2.0;
        assert!((metadata.average_confidence - expected).abs() < 1e-12);
    }

    #[test]
    fn test_metadata_empty() {
        let metadata = LineageTracker::default_config().compute_metadata(&[], 5);
        assert_eq!(metadata.total_sources, 0);
        assert_eq!(metadata.average_confidence, 0.0);
        assert_eq!(metadata.last_updated, None);
        assert_eq!(metadata.last_validated, 5);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = TrackerConfig {
            stale_freshness_threshold: -0.5,
            ..Default::default()
        };
        assert!(LineageTracker::new(config).is_err());
    }

    #[test]
    fn test_manual_field_state_accepted() {
        // A field assembled by hand is accepted as long as its invariants hold
        let tracker = LineageTracker::new(TrackerConfig::default()).unwrap();
        let field = MultiSourceField {
            current_value: 1,
            sources: vec![SourceRecord::new(C, 1, T)],
            primary_source: C,
            confidence: ConfidenceScore {
                value: 0.0,
                source_reliability: 0.0,
                freshness: 0.0,
                quality: 0.0,
            },
            has_conflict: false,
            conflict_details: Vec::new(),
        };
        let updated = tracker
            .add_or_update_source_at(&field, SourceRecord::new(C, 2, T + 1), "damage", T + 1)
            .unwrap();
        assert_eq!(updated.current_value, 2);
        assert_eq!(
            updated.confidence.source_reliability,
            SourceRegistry::standard().reliability(C).unwrap()
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// One record per source, values drawn from a small set to force conflicts
    fn final_set_strategy() -> impl Strategy<Value = Vec<SourceRecord<u8>>> {
        prop::collection::btree_map(0usize..7, (0u8..3, 0u64..5), 1..7).prop_map(|entries| {
            entries
                .into_iter()
                .map(|(source, (value, ts))| SourceRecord::new(DataSource::ALL[source], value, ts * 1_000))
                .collect()
        })
    }

    proptest! {
        /// Property: Incremental updates in any order equal one cold-start reconciliation
        #[test]
        fn test_incremental_updates_are_order_independent(
            (records, shuffled) in final_set_strategy()
                .prop_flat_map(|r| (Just(r.clone()), Just(r).prop_shuffle())),
        ) {
            let tracker = LineageTracker::default_config();
            let now = 10_000;

            let cold = tracker
                .create_multi_source_field_at(records, "damage", now)
                .unwrap();

            let mut iter = shuffled.into_iter();
            let first = iter.next().unwrap();
            let mut incremental = tracker
                .create_multi_source_field_at(vec![first], "damage", now)
                .unwrap();
            for record in iter {
                incremental = tracker
                    .add_or_update_source_at(&incremental, record, "damage", now)
                    .unwrap();
            }

            prop_assert_eq!(incremental, cold);
        }

        /// Property: Re-submitting a source's current record changes nothing
        #[test]
        fn test_resubmission_is_idempotent(records in final_set_strategy(), pick in 0usize..7) {
            let tracker = LineageTracker::default_config();
            let field = tracker
                .create_multi_source_field_at(records.clone(), "damage", 10_000)
                .unwrap();
            let again = records[pick % records.len()].clone();

            let updated = tracker
                .add_or_update_source_at(&field, again, "damage", 10_000)
                .unwrap();
            prop_assert_eq!(updated, field);
        }
    }
}
