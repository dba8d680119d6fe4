//! Source records - one source's claim about one field at one instant

use crate::DataSource;

/// A single observation: "source S claimed value V at time T"
///
/// Produced by upstream collectors and never mutated by the engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceRecord<T> {
    /// Who made the claim
    pub source: DataSource,

    /// The claimed value
    pub value: T,

    /// When the claim was observed (epoch millis)
    pub timestamp: u64,

    /// Optional link back to the origin (URL, patch id, ...)
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub reference: Option<String>,

    /// Optional free-form notes from the collector
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub notes: Option<String>,
}

impl<T> SourceRecord<T> {
    /// Create a new source record
    pub fn new(source: DataSource, value: T, timestamp: u64) -> Self {
        Self {
            source,
            value,
            timestamp,
            reference: None,
            notes: None,
        }
    }

    /// Attach a reference to the record
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Attach collector notes to the record
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let record = SourceRecord::new(DataSource::PatchNotes, 35, 1_000)
            .with_reference("patch-1.2")
            .with_notes("buffed");

        assert_eq!(record.value, 35);
        assert_eq!(record.reference.as_deref(), Some("patch-1.2"));
        assert_eq!(record.notes.as_deref(), Some("buffed"));
    }
}
