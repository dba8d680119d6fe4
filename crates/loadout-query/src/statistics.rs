//! Aggregates over lineage history records

use loadout_domain::{DataSource, HistoryKey, LineageHistoryRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Bucket for records without a change reason
pub const UNSPECIFIED_REASON: &str = "unspecified";

/// Summary of a set of history records
///
/// A pure aggregation: computing it performs no I/O. Records sharing a
/// [`HistoryKey`] are counted once, so statistics over a set containing a
/// retried write match statistics over the stored log.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineageStatistics {
    /// Distinct records considered
    pub total_records: usize,

    /// Distinct weapon ids
    pub unique_entities: usize,

    /// Distinct field names
    pub unique_fields: usize,

    /// Records with no previous value
    pub initial_observations: usize,

    /// Mean confidence (0.0 for an empty set)
    pub average_confidence: f64,

    /// Lowest confidence
    pub min_confidence: Option<f64>,

    /// Highest confidence
    pub max_confidence: Option<f64>,

    /// Record count per source
    pub by_source: BTreeMap<DataSource, usize>,

    /// Record count per change reason
    pub by_reason: BTreeMap<String, usize>,

    /// Oldest timestamp (epoch millis)
    pub first_change: Option<u64>,

    /// Newest timestamp (epoch millis)
    pub last_change: Option<u64>,
}

impl LineageStatistics {
    /// Aggregate `records`; an empty slice yields zero counts
    pub fn from_records<T>(records: &[LineageHistoryRecord<T>]) -> Self {
        let mut seen: BTreeSet<HistoryKey> = BTreeSet::new();
        let mut entities: BTreeSet<&str> = BTreeSet::new();
        let mut fields: BTreeSet<&str> = BTreeSet::new();
        let mut stats = Self::default();
        let mut confidence_sum = 0.0;

        for record in records {
            if !seen.insert(record.key()) {
                continue;
            }

            stats.total_records += 1;
            entities.insert(&record.weapon_id);
            fields.insert(&record.field);
            if record.is_initial() {
                stats.initial_observations += 1;
            }

            confidence_sum += record.confidence;
            stats.min_confidence = Some(
                stats
                    .min_confidence
                    .map_or(record.confidence, |min| min.min(record.confidence)),
            );
            stats.max_confidence = Some(
                stats
                    .max_confidence
                    .map_or(record.confidence, |max| max.max(record.confidence)),
            );

            *stats.by_source.entry(record.source).or_insert(0) += 1;
            let reason = record.reason.as_deref().unwrap_or(UNSPECIFIED_REASON);
            *stats.by_reason.entry(reason.to_string()).or_insert(0) += 1;

            stats.first_change = Some(stats.first_change.map_or(record.timestamp, |t| t.min(record.timestamp)));
            stats.last_change = Some(stats.last_change.map_or(record.timestamp, |t| t.max(record.timestamp)));
        }

        stats.unique_entities = entities.len();
        stats.unique_fields = fields.len();
        if stats.total_records > 0 {
            stats.average_confidence = confidence_sum / stats.total_records as f64;
        }
        stats
    }

    /// Human-readable one-paragraph summary
    pub fn summary(&self) -> String {
        if self.total_records == 0 {
            return "No lineage history".to_string();
        }
        format!(
            "{} records across {} entities and {} fields; {} initial observations; \
             average confidence {:.3}",
            self.total_records,
            self.unique_entities,
            self.unique_fields,
            self.initial_observations,
            self.average_confidence,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        weapon_id: &str,
        field: &str,
        ts: u64,
        source: DataSource,
        old: Option<i32>,
        confidence: f64,
        reason: Option<&str>,
    ) -> LineageHistoryRecord<i32> {
        LineageHistoryRecord::new(
            weapon_id.to_string(),
            field.to_string(),
            old,
            1,
            source,
            confidence,
            reason.map(str::to_string),
            None,
            ts,
        )
    }

    #[test]
    fn test_empty_set() {
        let stats = LineageStatistics::from_records::<i32>(&[]);
        assert_eq!(stats, LineageStatistics::default());
        assert_eq!(stats.average_confidence, 0.0);
        assert_eq!(stats.first_change, None);
        assert_eq!(stats.summary(), "No lineage history");
    }

    #[test]
    fn test_aggregates() {
        let records = vec![
            record("ak-47", "damage", 10, DataSource::OfficialApi, None, 0.9, Some("patch")),
            record("ak-47", "damage", 20, DataSource::OfficialApi, Some(1), 0.7, Some("patch")),
            record("ak-47", "range", 15, DataSource::CommunityWiki, None, 0.5, None),
            record("mp5", "damage", 5, DataSource::UserSubmission, None, 0.3, Some("correction")),
        ];

        let stats = LineageStatistics::from_records(&records);
        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.unique_entities, 2);
        assert_eq!(stats.unique_fields, 2);
        assert_eq!(stats.initial_observations, 3);
        assert!((stats.average_confidence - 0.6).abs() < 1e-12);
        assert_eq!(stats.min_confidence, Some(0.3));
        assert_eq!(stats.max_confidence, Some(0.9));
        assert_eq!(stats.by_source[&DataSource::OfficialApi], 2);
        assert_eq!(stats.by_source.get(&DataSource::Curator), None);
        assert_eq!(stats.by_reason["patch"], 2);
        assert_eq!(stats.by_reason[UNSPECIFIED_REASON], 1);
        assert_eq!(stats.first_change, Some(5));
        assert_eq!(stats.last_change, Some(20));
    }

    #[test]
    fn test_duplicate_keys_counted_once() {
        let r = record("ak-47", "damage", 10, DataSource::OfficialApi, None, 0.9, None);
        let once = LineageStatistics::from_records(&[r.clone()]);
        let twice = LineageStatistics::from_records(&[r.clone(), r]);
        assert_eq!(once, twice);
    }
}
