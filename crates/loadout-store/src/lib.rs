//! Loadout Storage Layer
//!
//! Implements the [`HistoryStore`](loadout_domain::traits::HistoryStore) trait
//! for lineage history records.
//!
//! # Architecture
//!
//! - [`SqliteHistoryStore`]: durable storage, one row per history record,
//!   field values encoded as JSON text
//! - [`MemoryHistoryStore`]: volatile map for tests and dry runs
//!
//! Both are append-only. Records are keyed by
//! `(weapon_id, field, timestamp, source)` and re-inserting a key is a no-op,
//! so retried batches never duplicate history.
//!
//! # Examples
//!
//! ```
//! use loadout_domain::traits::{HistoryStore, LineageQueryFilters};
//! use loadout_domain::{DataSource, LineageHistoryRecord};
//! use loadout_store::SqliteHistoryStore;
//!
//! let mut store = SqliteHistoryStore::in_memory().unwrap();
//! let record = LineageHistoryRecord::new(
//!     "ak-47".to_string(),
//!     "damage".to_string(),
//!     None,
//!     35,
//!     DataSource::OfficialApi,
//!     0.92,
//!     Some("initial import".to_string()),
//!     None,
//!     1_700_000_000_000,
//! );
//!
//! assert!(store.insert_history(&record).unwrap());
//! let history: Vec<LineageHistoryRecord<i32>> = store
//!     .query_history(&LineageQueryFilters::for_field("ak-47", "damage"))
//!     .unwrap();
//! assert_eq!(history, vec![record]);
//! ```

#![warn(missing_docs)]

mod error;
mod memory;
mod sqlite;

pub use error::StoreError;
pub use memory::MemoryHistoryStore;
pub use sqlite::SqliteHistoryStore;
