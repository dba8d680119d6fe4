//! Configuration for the query service

use crate::QueryError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the [`crate::LineageQueryService`]
///
/// Loadable as a TOML section:
///
/// ```toml
/// [query]
/// operation_timeout_ms = 5000
/// max_batch_size = 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Upper bound on a single store call (milliseconds)
    /// Default: 5000
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,

    /// Largest batch accepted by `batch_store_history`
    /// Default: 500
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_operation_timeout_ms() -> u64 {
    5_000
}

fn default_max_batch_size() -> usize {
    500
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            operation_timeout_ms: default_operation_timeout_ms(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl QueryConfig {
    /// Interactive preset: fail fast, small batches
    pub fn interactive() -> Self {
        Self {
            operation_timeout_ms: 1_000,
            max_batch_size: 100,
        }
    }

    /// Bulk preset: long timeouts for imports and backfills
    pub fn bulk() -> Self {
        Self {
            operation_timeout_ms: 30_000,
            max_batch_size: 5_000,
        }
    }

    /// Get the operation timeout as a Duration
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.operation_timeout_ms == 0 {
            return Err(QueryError::Validation {
                field: "operation_timeout_ms".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.max_batch_size == 0 {
            return Err(QueryError::Validation {
                field: "max_batch_size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QueryConfig::default();
        assert_eq!(config.operation_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_batch_size, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(QueryConfig::interactive().validate().is_ok());
        assert!(QueryConfig::bulk().validate().is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        let config = QueryConfig {
            max_batch_size: 0,
            ..Default::default()
        };
        match config.validate() {
            Err(QueryError::Validation { field, .. }) => assert_eq!(field, "max_batch_size"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: QueryConfig = toml::from_str("max_batch_size = 50").unwrap();
        assert_eq!(config.max_batch_size, 50);
        assert_eq!(config.operation_timeout_ms, 5_000);
    }
}
