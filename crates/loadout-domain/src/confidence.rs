//! Confidence score - a composite value with its explainable components

/// Composite confidence for a reconciled field
///
/// `value` is derived from the three components and is never set
/// independently; use [`crate::confidence_computation::score`] to build one.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfidenceScore {
    /// Composite score [0.0, 1.0]
    pub value: f64,

    /// Prior reliability of the primary source [0.0, 1.0]
    pub source_reliability: f64,

    /// Time-decayed freshness of the primary observation [0.0, 1.0]
    pub freshness: f64,

    /// Cross-source agreement with the primary value [0.0, 1.0]
    pub quality: f64,
}

impl ConfidenceScore {
    /// Whether the primary observation has decayed below `threshold`
    pub fn is_stale(&self, threshold: f64) -> bool {
        self.freshness < threshold
    }
}
