//! SQLite-backed history store

use crate::StoreError;
use loadout_domain::traits::{HistoryStore, LineageQueryFilters};
use loadout_domain::{DataSource, LineageHistoryRecord};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

const INSERT_SQL: &str = "INSERT INTO lineage_history
     (weapon_id, field, timestamp, source, old_value, new_value, confidence, reason, reference)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
     ON CONFLICT(weapon_id, field, timestamp, source) DO NOTHING";

/// SQLite-based implementation of [`HistoryStore`]
///
/// Field values are stored as JSON text, so one database can hold history for
/// fields of any serializable type. Reading a record back with a different
/// value type than it was written with fails with
/// [`StoreError::Serialization`].
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// store instance, or share one behind a mutex as the query service does.
pub struct SqliteHistoryStore {
    conn: Connection,
}

/// A history record encoded for storage
struct Row {
    weapon_id: String,
    field: String,
    timestamp: i64,
    source: &'static str,
    old_value: Option<String>,
    new_value: String,
    confidence: f64,
    reason: Option<String>,
    reference: Option<String>,
}

/// A stored row before the values are decoded
struct RawRow {
    weapon_id: String,
    field: String,
    timestamp: i64,
    source: String,
    old_value: Option<String>,
    new_value: String,
    confidence: f64,
    reason: Option<String>,
    reference: Option<String>,
}

impl SqliteHistoryStore {
    /// Open (or create) a store at the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use loadout_store::SqliteHistoryStore;
    ///
    /// let store = SqliteHistoryStore::new("loadout.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:")
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Total number of stored records
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM lineage_history", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn encode<T: Serialize>(record: &LineageHistoryRecord<T>) -> Result<Row, StoreError> {
        let timestamp = i64::try_from(record.timestamp).map_err(|_| {
            StoreError::InvalidData(format!("timestamp {} does not fit in SQLite", record.timestamp))
        })?;
        let old_value = match &record.old_value {
            Some(value) => Some(serde_json::to_string(value)?),
            None => None,
        };

        Ok(Row {
            weapon_id: record.weapon_id.clone(),
            field: record.field.clone(),
            timestamp,
            source: record.source.as_str(),
            old_value,
            new_value: serde_json::to_string(&record.new_value)?,
            confidence: record.confidence,
            reason: record.reason.clone(),
            reference: record.reference.clone(),
        })
    }

    fn decode<T: DeserializeOwned>(raw: RawRow) -> Result<LineageHistoryRecord<T>, StoreError> {
        let source = DataSource::parse(&raw.source)
            .ok_or_else(|| StoreError::InvalidData(format!("Unknown source: {}", raw.source)))?;
        let timestamp = u64::try_from(raw.timestamp)
            .map_err(|_| StoreError::InvalidData(format!("Negative timestamp: {}", raw.timestamp)))?;
        let old_value = match raw.old_value {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        };

        Ok(LineageHistoryRecord::new(
            raw.weapon_id,
            raw.field,
            old_value,
            serde_json::from_str(&raw.new_value)?,
            source,
            raw.confidence,
            raw.reason,
            raw.reference,
            timestamp,
        ))
    }

    fn insert_row(conn: &Connection, row: &Row) -> Result<bool, StoreError> {
        let changed = conn.execute(
            INSERT_SQL,
            params![
                &row.weapon_id,
                &row.field,
                row.timestamp,
                row.source,
                &row.old_value,
                &row.new_value,
                row.confidence,
                &row.reason,
                &row.reference,
            ],
        )?;
        Ok(changed == 1)
    }
}

/// Clamp a millisecond bound into SQLite's signed integer range
fn bound(millis: u64) -> i64 {
    i64::try_from(millis).unwrap_or(i64::MAX)
}

impl<T> HistoryStore<T> for SqliteHistoryStore
where
    T: Serialize + DeserializeOwned,
{
    type Error = StoreError;

    fn insert_history(&mut self, record: &LineageHistoryRecord<T>) -> Result<bool, Self::Error> {
        let row = Self::encode(record)?;
        Self::insert_row(&self.conn, &row)
    }

    fn insert_history_batch(&mut self, records: &[LineageHistoryRecord<T>]) -> Result<usize, Self::Error> {
        // Encode everything before touching the database
        let rows = records
            .iter()
            .map(Self::encode)
            .collect::<Result<Vec<_>, _>>()?;

        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        for row in &rows {
            if Self::insert_row(&tx, row)? {
                inserted += 1;
            }
        }
        tx.commit()?;

        Ok(inserted)
    }

    fn query_history(&self, filters: &LineageQueryFilters) -> Result<Vec<LineageHistoryRecord<T>>, Self::Error> {
        let mut sql = String::from(
            "SELECT weapon_id, field, timestamp, source, old_value, new_value, confidence, reason, reference
             FROM lineage_history WHERE 1=1",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(weapon_id) = &filters.weapon_id {
            sql.push_str(" AND weapon_id = ?");
            params.push(Box::new(weapon_id.clone()));
        }

        if let Some(field) = &filters.field {
            sql.push_str(" AND field = ?");
            params.push(Box::new(field.clone()));
        }

        if let Some(source) = filters.source {
            sql.push_str(" AND source = ?");
            params.push(Box::new(source.as_str()));
        }

        if let Some(start) = filters.start_time {
            sql.push_str(" AND timestamp >= ?");
            params.push(Box::new(bound(start)));
        }

        if let Some(end) = filters.end_time {
            sql.push_str(" AND timestamp <= ?");
            params.push(Box::new(bound(end)));
        }

        if let Some(min_conf) = filters.min_confidence {
            sql.push_str(" AND confidence >= ?");
            params.push(Box::new(min_conf));
        }

        sql.push_str(" ORDER BY timestamp ASC, weapon_id ASC, field ASC, source ASC");

        if let Some(limit) = filters.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(bound(limit as u64)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let raw = stmt
            .query_map(&param_refs[..], |row| {
                Ok(RawRow {
                    weapon_id: row.get(0)?,
                    field: row.get(1)?,
                    timestamp: row.get(2)?,
                    source: row.get(3)?,
                    old_value: row.get(4)?,
                    new_value: row.get(5)?,
                    confidence: row.get(6)?,
                    reason: row.get(7)?,
                    reference: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter().map(Self::decode).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_clamps() {
        assert_eq!(bound(5), 5);
        assert_eq!(bound(u64::MAX), i64::MAX);
    }

    #[test]
    fn test_oversized_timestamp_rejected() {
        let mut store = SqliteHistoryStore::in_memory().unwrap();
        let record = LineageHistoryRecord::new(
            "ak-47".to_string(),
            "damage".to_string(),
            None,
            35,
            DataSource::OfficialApi,
            0.9,
            None,
            None,
            u64::MAX,
        );
        let err = store.insert_history(&record).unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[test]
    fn test_unknown_source_in_row() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO lineage_history (weapon_id, field, timestamp, source, new_value, confidence)
                 VALUES ('ak-47', 'damage', 1, 'forum', '35', 0.5)",
                [],
            )
            .unwrap();

        let result: Result<Vec<LineageHistoryRecord<i32>>, _> =
            store.query_history(&LineageQueryFilters::default());
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }
}
