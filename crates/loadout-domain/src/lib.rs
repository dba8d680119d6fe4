//! Loadout Domain Layer
//!
//! This crate contains the pure reconciliation core of Loadout: the engine
//! that merges possibly-conflicting observations of the same weapon stat from
//! several data sources into one authoritative value with a confidence score.
//! It performs no I/O and holds no shared mutable state.
//!
//! ## Key Concepts
//!
//! - **Source**: A closed set of providers, each with a reliability prior
//! - **Source Record**: One source's claimed value for one field at one instant
//! - **Confidence Score**: Reliability × freshness × agreement, kept explainable
//! - **Multi-Source Field**: The reconciled value, its primary source and conflicts
//! - **Lineage History**: Append-only audit records of value transitions
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture:
//! - Pure business logic only (serde derives are behind the `serde` feature)
//! - Reliability tables and confidence parameters are injected, never global
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions
//!
//! # Examples
//!
//! ```
//! use loadout_domain::{DataSource, FieldReconciler, SourceRecord};
//!
//! let records = vec![
//!     SourceRecord::new(DataSource::OfficialApi, 35, 1_000),
//!     SourceRecord::new(DataSource::CommunityWiki, 34, 900),
//! ];
//!
//! let field = FieldReconciler::default()
//!     .reconcile_at(&records, "damage", 1_000)
//!     .unwrap();
//!
//! assert_eq!(field.current_value, 35);
//! assert_eq!(field.primary_source, DataSource::OfficialApi);
//! assert!(field.has_conflict);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod confidence;
pub mod confidence_computation;
pub mod error;
pub mod field;
pub mod history;
pub mod reconcile;
pub mod record;
pub mod source;
pub mod traits;

// Re-exports for convenience
pub use confidence::ConfidenceScore;
pub use confidence_computation::ConfidenceConfig;
pub use error::LineageError;
pub use field::{ConflictDetail, ConflictValue, FieldLineage, MultiSourceField};
pub use history::{FieldHistory, FieldHistoryEntry, HistoryKey, LineageHistoryRecord, LineageMetadata};
pub use reconcile::{values_equal, FieldReconciler};
pub use record::SourceRecord;
pub use source::{DataSource, SourceRegistry};
