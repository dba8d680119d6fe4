//! Configuration for lineage tracking
//!
//! Confidence parameters, reliability overrides and the staleness threshold
//! used in per-entity rollups. Loadable from TOML:
//!
//! ```toml
//! stale_freshness_threshold = 0.5
//!
//! [confidence]
//! freshness_decay_rate = 0.01
//! reliability_weight = 0.5
//! freshness_weight = 0.2
//! quality_weight = 0.3
//!
//! [reliability]
//! community_wiki = 0.65
//! ```

use crate::error::{Result, TrackerError};
use loadout_domain::{ConfidenceConfig, DataSource, FieldReconciler, SourceRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration for the [`crate::LineageTracker`]
///
/// # Examples
///
/// ```
/// use loadout_tracker::TrackerConfig;
///
/// let config = TrackerConfig::default();
/// assert_eq!(config.stale_freshness_threshold, 0.5);
///
/// // Frequently patched titles: values go stale within weeks
/// let config = TrackerConfig::volatile();
/// assert!(config.confidence.freshness_decay_rate > 0.01);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Confidence computation parameters
    #[serde(default)]
    pub confidence: ConfidenceConfig,

    /// Freshness below which a field counts as stale in rollups
    /// Default: 0.5
    #[serde(default = "default_stale_freshness_threshold")]
    pub stale_freshness_threshold: f64,

    /// Reliability overrides applied on top of the standard table,
    /// keyed by source name (e.g. `community_wiki`)
    #[serde(default)]
    pub reliability: BTreeMap<String, f64>,
}

fn default_stale_freshness_threshold() -> f64 {
    0.5
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            confidence: ConfidenceConfig::default(),
            stale_freshness_threshold: default_stale_freshness_threshold(),
            reliability: BTreeMap::new(),
        }
    }
}

impl TrackerConfig {
    /// Fast decay for titles patched every few weeks
    ///
    /// - Decay rate: 0.05/day (half-life about two weeks)
    /// - Freshness weighted as heavily as agreement
    pub fn volatile() -> Self {
        Self {
            confidence: ConfidenceConfig {
                freshness_decay_rate: 0.05,
                reliability_weight: 0.4,
                freshness_weight: 0.3,
                quality_weight: 0.3,
            },
            stale_freshness_threshold: 0.6,
            reliability: BTreeMap::new(),
        }
    }

    /// Slow decay for titles that no longer receive balance patches
    ///
    /// - Decay rate: 0.001/day
    /// - Freshness barely weighted
    pub fn stable() -> Self {
        Self {
            confidence: ConfidenceConfig {
                freshness_decay_rate: 0.001,
                reliability_weight: 0.6,
                freshness_weight: 0.05,
                quality_weight: 0.35,
            },
            stale_freshness_threshold: 0.3,
            reliability: BTreeMap::new(),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: TrackerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value, naming the first one out of range
    pub fn validate(&self) -> Result<()> {
        self.confidence.validate()?;

        let threshold = self.stale_freshness_threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(TrackerError::Config(format!(
                "stale_freshness_threshold {} is outside [0.0, 1.0]",
                threshold
            )));
        }

        self.registry()?;
        Ok(())
    }

    /// The standard reliability table with overrides applied
    pub fn registry(&self) -> Result<SourceRegistry> {
        let mut registry = SourceRegistry::standard();
        for (name, weight) in &self.reliability {
            let source = DataSource::parse(name).ok_or_else(|| {
                TrackerError::Config(format!("unknown source '{}' in [reliability]", name))
            })?;
            registry = registry.with_override(source, *weight)?;
        }
        Ok(registry)
    }

    /// Build a reconciler from this configuration
    pub fn reconciler(&self) -> Result<FieldReconciler> {
        Ok(FieldReconciler::new(self.registry()?, self.confidence)?)
    }
}
