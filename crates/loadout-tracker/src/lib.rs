//! Loadout Lineage Tracker
//!
//! High-level entry points over the reconciliation core: building reconciled
//! fields from scratch, merging one new observation at a time, producing
//! lineage history records for value transitions, and rolling up per-entity
//! metadata.
//!
//! # Overview
//!
//! The tracker is responsible for:
//! - **Cold-start reconciliation**: A full set of source records becomes a
//!   [`loadout_domain::MultiSourceField`]
//! - **Incremental updates**: A record from a known source supersedes that
//!   source's record; a record from a new source is appended
//! - **History records**: Audit entries for value transitions, built only when
//!   the caller (or [`LineageTracker::record_change`]) sees a change
//! - **Metadata rollups**: Source counts, conflicts and stale fields per entity
//!
//! Nothing here performs I/O. Persisting history records is the job of the
//! query service.
//!
//! # Usage
//!
//! ```
//! use loadout_domain::{DataSource, SourceRecord};
//! use loadout_tracker::LineageTracker;
//!
//! let tracker = LineageTracker::default_config();
//! let field = tracker
//!     .create_multi_source_field_at(
//!         vec![
//!             SourceRecord::new(DataSource::OfficialApi, 35, 1_000),
//!             SourceRecord::new(DataSource::CommunityWiki, 34, 900),
//!         ],
//!         "damage",
//!         1_000,
//!     )
//!     .unwrap();
//!
//! let record = tracker
//!     .record_change("ak-47", "damage", None, &field, None, None, 1_000)
//!     .unwrap();
//! assert!(record.is_initial());
//! ```
//!
//! ## Configuration Presets
//!
//! ```
//! use loadout_tracker::TrackerConfig;
//!
//! // Default: 0.01/day decay, weights 0.5 / 0.2 / 0.3
//! let config = TrackerConfig::default();
//!
//! // Volatile: titles patched every few weeks
//! let config = TrackerConfig::volatile();
//!
//! // Stable: titles no longer receiving balance patches
//! let config = TrackerConfig::stable();
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod tracker;

pub use config::TrackerConfig;
pub use error::{Result, TrackerError};
pub use tracker::LineageTracker;
