//! Confidence computation
//!
//! Deterministic scoring of a reconciled field from three components:
//! 1. Source reliability (prior of the primary source)
//! 2. Freshness (exponential decay of the primary observation's age)
//! 3. Quality (fraction of other records agreeing with the primary value)
//!
//! The components are combined with a weighted geometric mean, which is
//! monotonically non-decreasing in each component for non-negative weights.

use crate::error::{LineageError, Result};
use crate::{ConfidenceScore, DataSource, SourceRecord, SourceRegistry};

/// Milliseconds per day, the unit of [`ConfidenceConfig::freshness_decay_rate`]
pub const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Default decay rate per day of age (half-life of roughly 69 days)
pub const FRESHNESS_DECAY_RATE: f64 = 0.01;

/// Default weight of the source reliability component
pub const RELIABILITY_WEIGHT: f64 = 0.5;

/// Default weight of the freshness component
pub const FRESHNESS_WEIGHT: f64 = 0.2;

/// Default weight of the quality component
pub const QUALITY_WEIGHT: f64 = 0.3;

/// Tunable parameters for confidence computation
///
/// `DEFAULT_CONFIDENCE_CONFIG` is [`ConfidenceConfig::default`]; callers may
/// pass an alternate value per invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConfidenceConfig {
    /// Exponential decay rate per day of observation age
    pub freshness_decay_rate: f64,
    /// Exponent weight for source reliability
    pub reliability_weight: f64,
    /// Exponent weight for freshness
    pub freshness_weight: f64,
    /// Exponent weight for quality
    pub quality_weight: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            freshness_decay_rate: FRESHNESS_DECAY_RATE,
            reliability_weight: RELIABILITY_WEIGHT,
            freshness_weight: FRESHNESS_WEIGHT,
            quality_weight: QUALITY_WEIGHT,
        }
    }
}

impl ConfidenceConfig {
    /// Check every coefficient, naming the first one out of range
    pub fn validate(&self) -> Result<()> {
        let invalid = |parameter: &str, reason: String| LineageError::InvalidConfig {
            parameter: parameter.to_string(),
            reason,
        };

        if !self.freshness_decay_rate.is_finite() || self.freshness_decay_rate < 0.0 {
            return Err(invalid(
                "freshness_decay_rate",
                format!("{} must be a finite, non-negative rate", self.freshness_decay_rate),
            ));
        }

        let weights = [
            ("reliability_weight", self.reliability_weight),
            ("freshness_weight", self.freshness_weight),
            ("quality_weight", self.quality_weight),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid(
                    name,
                    format!("{} must be a finite, non-negative weight", weight),
                ));
            }
        }

        if self.total_weight() <= 0.0 {
            return Err(invalid(
                "weights",
                "at least one component weight must be positive".to_string(),
            ));
        }

        Ok(())
    }

    fn total_weight(&self) -> f64 {
        self.reliability_weight + self.freshness_weight + self.quality_weight
    }
}

/// Score a set of records given the chosen primary source
///
/// The primary record is the most recent record from `primary`. Values are
/// compared with `PartialEq`.
///
/// # Errors
/// - [`LineageError::EmptySourceSet`] if `records` is empty
/// - [`LineageError::InvalidFieldState`] if no record comes from `primary`
/// - [`LineageError::UnknownSource`] if `primary` is not in `registry`
/// - [`LineageError::InvalidConfig`] if `config` fails validation
pub fn score<T: PartialEq>(
    records: &[SourceRecord<T>],
    field: &str,
    primary: DataSource,
    now: u64,
    registry: &SourceRegistry,
    config: &ConfidenceConfig,
) -> Result<ConfidenceScore> {
    config.validate()?;

    let primary_record = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.source == primary)
        .max_by_key(|(_, r)| r.timestamp)
        .map(|(index, _)| index);

    let Some(primary_index) = primary_record else {
        return Err(if records.is_empty() {
            LineageError::EmptySourceSet {
                field: field.to_string(),
            }
        } else {
            LineageError::InvalidFieldState {
                field: field.to_string(),
                reason: format!("primary source '{}' has no record", primary),
            }
        });
    };

    score_primary(records, primary_index, now, registry, config)
}

/// Score with the primary record already located (used by the reconciler)
pub(crate) fn score_primary<T: PartialEq>(
    records: &[SourceRecord<T>],
    primary_index: usize,
    now: u64,
    registry: &SourceRegistry,
    config: &ConfidenceConfig,
) -> Result<ConfidenceScore> {
    let primary = &records[primary_index];

    let source_reliability = registry.reliability(primary.source)?;
    let freshness = compute_freshness(now, primary.timestamp, config.freshness_decay_rate);
    let quality = compute_quality(records, primary_index);
    let value = combine(source_reliability, freshness, quality, config);

    Ok(ConfidenceScore {
        value,
        source_reliability,
        freshness,
        quality,
    })
}

/// Freshness as exponential decay of the observation's age
///
/// Negative ages (observation stamped in the future) count as zero age.
pub fn compute_freshness(now: u64, observed_at: u64, decay_rate_per_day: f64) -> f64 {
    let age_ms = now.saturating_sub(observed_at) as f64;
    let age_days = age_ms / MILLIS_PER_DAY;
    (-decay_rate_per_day * age_days).exp().clamp(0.0, 1.0)
}

/// Agreement of the non-primary records with the primary value
///
/// `1 - disagreeing / non_primary`; a lone record scores 1.0.
fn compute_quality<T: PartialEq>(records: &[SourceRecord<T>], primary_index: usize) -> f64 {
    let primary_value = &records[primary_index].value;
    let others = records.len().saturating_sub(1);
    if others == 0 {
        return 1.0;
    }

    let disagreeing = records
        .iter()
        .enumerate()
        .filter(|(index, r)| *index != primary_index && r.value != *primary_value)
        .count();

    (1.0 - disagreeing as f64 / others as f64).clamp(0.0, 1.0)
}

/// Weighted geometric mean of the three components
///
/// A zero-weight component contributes a factor of one regardless of its
/// value (`0.0_f64.powf(0.0) == 1.0`).
pub fn combine(reliability: f64, freshness: f64, quality: f64, config: &ConfidenceConfig) -> f64 {
    let total = config.total_weight();
    let value = reliability.clamp(0.0, 1.0).powf(config.reliability_weight / total)
        * freshness.clamp(0.0, 1.0).powf(config.freshness_weight / total)
        * quality.clamp(0.0, 1.0).powf(config.quality_weight / total);
    value.clamp(0.0, 1.0)
}
