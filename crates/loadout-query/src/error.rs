//! Error types for the query service

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while storing or querying lineage history
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// A record, filter or setting failed validation; nothing was stored
    #[error("Validation error on '{field}': {reason}")]
    Validation {
        /// Name of the offending field (e.g. `records[3].confidence`)
        field: String,
        /// What was wrong with it
        reason: String,
    },

    /// The store rejected the operation or is unavailable
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The store did not answer within the configured timeout
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),
}

impl QueryError {
    /// Whether retrying the same call may succeed
    ///
    /// Retrying a batch is always safe: stores ignore keys they already hold.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueryError::Persistence(_) | QueryError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(QueryError::Persistence("disk full".to_string()).is_retryable());
        assert!(QueryError::Timeout(Duration::from_millis(10)).is_retryable());
        assert!(!QueryError::Validation {
            field: "confidence".to_string(),
            reason: "out of range".to_string(),
        }
        .is_retryable());
    }

    #[test]
    fn test_display_names_field() {
        let err = QueryError::Validation {
            field: "records[2].weapon_id".to_string(),
            reason: "must not be empty".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Validation error on 'records[2].weapon_id': must not be empty"
        );
    }
}
