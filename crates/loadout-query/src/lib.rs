//! Loadout Lineage Query Service
//!
//! The only component of Loadout that touches shared state: it persists
//! lineage history records through a
//! [`HistoryStore`](loadout_domain::traits::HistoryStore), queries them back,
//! and aggregates statistics.
//!
//! # Overview
//!
//! - **Append-only storage**: records are never updated or deleted; storing a
//!   key twice is a no-op, so whole-batch retries are safe
//! - **All-or-nothing batches**: a batch is validated before any write and
//!   committed atomically by the store
//! - **Bounded I/O**: each store call runs on the blocking pool under
//!   [`QueryConfig::operation_timeout`]
//! - **Distinct failures**: [`QueryError::Validation`] is never retryable,
//!   [`QueryError::Persistence`] and [`QueryError::Timeout`] are
//!
//! # Usage
//!
//! ```
//! use loadout_domain::{DataSource, LineageHistoryRecord};
//! use loadout_query::{LineageQueryService, QueryConfig};
//! use loadout_store::MemoryHistoryStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = LineageQueryService::new(MemoryHistoryStore::<i32>::new(), QueryConfig::default())?;
//!
//! let record = LineageHistoryRecord::new(
//!     "ak-47".to_string(),
//!     "damage".to_string(),
//!     Some(35),
//!     36,
//!     DataSource::OfficialApi,
//!     0.91,
//!     Some("patch".to_string()),
//!     None,
//!     1_700_000_000_000,
//! );
//! let receipt = service.batch_store_history(vec![record]).await?;
//! assert_eq!(receipt.stored, 1);
//!
//! let history = service.get_field_history::<i32>("ak-47", "damage").await?;
//! assert_eq!(history.latest(), Some(&36));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod service;
mod statistics;

pub use config::QueryConfig;
pub use error::QueryError;
pub use service::{BatchReceipt, LineageQueryService};
pub use statistics::{LineageStatistics, UNSPECIFIED_REASON};
