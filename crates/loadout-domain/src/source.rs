//! Source registry - the closed set of data providers and their priors

use crate::error::{LineageError, Result};
use std::collections::BTreeMap;
use std::fmt;

/// A known provider of weapon-stat observations
///
/// The set is closed. Declaration order doubles as the final tie-break when
/// two candidate records have equal reliability and equal timestamps: the
/// variant declared first wins. `Ord` follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DataSource {
    /// Authoritative vendor feed published by the game developer
    OfficialApi,

    /// Values transcribed from official patch notes
    PatchNotes,

    /// Values extracted from game files
    DataMine,

    /// Community analytics feeds (aggregated telemetry)
    CommunityAnalytics,

    /// Community-maintained wiki pages
    CommunityWiki,

    /// Manual entry by an internal curator
    Curator,

    /// Unverified user submissions
    UserSubmission,
}

impl DataSource {
    /// Every source, in tie-break order
    pub const ALL: [DataSource; 7] = [
        DataSource::OfficialApi,
        DataSource::PatchNotes,
        DataSource::DataMine,
        DataSource::CommunityAnalytics,
        DataSource::CommunityWiki,
        DataSource::Curator,
        DataSource::UserSubmission,
    ];

    /// Get the stable storage name of the source
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::OfficialApi => "official_api",
            DataSource::PatchNotes => "patch_notes",
            DataSource::DataMine => "data_mine",
            DataSource::CommunityAnalytics => "community_analytics",
            DataSource::CommunityWiki => "community_wiki",
            DataSource::Curator => "curator",
            DataSource::UserSubmission => "user_submission",
        }
    }

    /// Parse a source from its storage name (case-insensitive, `-` accepted for `_`)
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|source| source.as_str() == normalized)
    }

    /// Prior reliability of the source in the standard table
    ///
    /// Exhaustive over the enum: adding a variant without a weight does not compile.
    pub fn default_reliability(&self) -> f64 {
        match self {
            DataSource::OfficialApi => 0.95,
            DataSource::PatchNotes => 0.90,
            DataSource::DataMine => 0.80,
            DataSource::CommunityAnalytics => 0.70,
            DataSource::CommunityWiki => 0.60,
            DataSource::Curator => 0.50,
            DataSource::UserSubmission => 0.30,
        }
    }

    /// Position in the tie-break order (0 = preferred)
    pub fn rank(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid data source: {}", s))
    }
}

/// Reliability table keyed by source
///
/// Injected into the scorer and reconciler rather than read from global
/// state, so tests and deployments can substitute alternate priors.
/// Weights are independent priors in `[0, 1]`; they need not sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRegistry {
    weights: BTreeMap<DataSource, f64>,
}

impl SourceRegistry {
    /// The standard `SOURCE_RELIABILITY` table
    pub fn standard() -> Self {
        Self {
            weights: DataSource::ALL
                .into_iter()
                .map(|source| (source, source.default_reliability()))
                .collect(),
        }
    }

    /// Build a registry from explicit weights
    ///
    /// Sources absent from `weights` are unregistered; looking them up fails
    /// with [`LineageError::UnknownSource`].
    ///
    /// # Errors
    /// Returns [`LineageError::InvalidConfig`] naming the source if a weight
    /// is not a finite number in `[0, 1]`.
    pub fn with_weights<I>(weights: I) -> Result<Self>
    where
        I: IntoIterator<Item = (DataSource, f64)>,
    {
        let mut table = BTreeMap::new();
        for (source, weight) in weights {
            validate_weight(source, weight)?;
            table.insert(source, weight);
        }
        Ok(Self { weights: table })
    }

    /// Return a copy of this registry with one weight replaced
    pub fn with_override(mut self, source: DataSource, weight: f64) -> Result<Self> {
        validate_weight(source, weight)?;
        self.weights.insert(source, weight);
        Ok(self)
    }

    /// Look up the reliability prior for a source
    pub fn reliability(&self, source: DataSource) -> Result<f64> {
        self.weights
            .get(&source)
            .copied()
            .ok_or(LineageError::UnknownSource { data_source: source })
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn validate_weight(source: DataSource, weight: f64) -> Result<()> {
    if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
        return Err(LineageError::InvalidConfig {
            parameter: format!("reliability.{}", source),
            reason: format!("weight {} is outside [0.0, 1.0]", weight),
        });
    }
    Ok(())
}
