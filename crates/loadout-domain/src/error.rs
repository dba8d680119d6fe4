//! Error types for the reconciliation core

use crate::DataSource;
use thiserror::Error;

/// Errors raised by the pure reconciliation core
///
/// Every variant names the field, source or parameter involved so that an
/// upstream surface can render a meaningful message. A conflict between
/// sources is never an error; it is reported on the reconciled field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LineageError {
    /// No observations were supplied for a field
    #[error("No source records supplied for field '{field}'")]
    EmptySourceSet {
        /// Field being reconciled
        field: String,
    },

    /// A source has no entry in the active reliability table
    #[error("Source '{data_source}' is not registered in the reliability table")]
    UnknownSource {
        /// The unregistered source
        data_source: DataSource,
    },

    /// An existing reconciled field is malformed
    #[error("Invalid state for field '{field}': {reason}")]
    InvalidFieldState {
        /// Field whose state is invalid
        field: String,
        /// Description of the violated invariant
        reason: String,
    },

    /// Two top-ranked records from one source share a timestamp but disagree
    #[error(
        "Ambiguous observations for field '{field}': source '{data_source}' reported different values at {timestamp}"
    )]
    AmbiguousObservation {
        /// Field being reconciled
        field: String,
        /// Source that reported both values
        data_source: DataSource,
        /// Shared timestamp (epoch millis)
        timestamp: u64,
    },

    /// A caller-supplied configuration value is out of range
    #[error("Invalid configuration '{parameter}': {reason}")]
    InvalidConfig {
        /// Offending parameter name
        parameter: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Result alias for the domain layer
pub type Result<T> = std::result::Result<T, LineageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_subject() {
        let err = LineageError::EmptySourceSet {
            field: "damage".to_string(),
        };
        assert!(err.to_string().contains("damage"));

        let err = LineageError::UnknownSource {
            data_source: DataSource::Curator,
        };
        assert!(err.to_string().contains("curator"));
    }
}
