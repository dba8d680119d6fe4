//! End-to-end tests for the ingest pipeline: parse, replay, store, query.

use loadout_cli::commands::ingest::replay;
use loadout_cli::commands::parse_field_inputs;
use loadout_cli::commands::reconcile::reconcile_inputs;
use loadout_cli::Config;
use loadout_domain::traits::LineageQueryFilters;
use loadout_domain::{DataSource, LineageHistoryRecord};
use loadout_query::LineageQueryService;
use loadout_store::SqliteHistoryStore;
use loadout_tracker::LineageTracker;
use serde_json::{json, Value};
use tempfile::TempDir;

const T: u64 = 1_700_000_000_000;
const HOUR: u64 = 3_600_000;

fn document() -> String {
    json!([
        {
            "weapon_id": "ak-47",
            "field": "damage",
            "observations": [
                { "source": "community_wiki", "value": 34, "timestamp": T - 2 * HOUR },
                { "source": "official_api", "value": 35, "timestamp": T, "reference": "patch-1.2" }
            ]
        },
        {
            "weapon_id": "ak-47",
            "field": "falloff",
            "observations": [
                { "source": "data_mine", "value": { "start": 20, "end": 45 }, "timestamp": T }
            ]
        }
    ])
    .to_string()
}

fn replay_all(tracker: &LineageTracker) -> Vec<LineageHistoryRecord<Value>> {
    parse_field_inputs(&document())
        .unwrap()
        .into_iter()
        .flat_map(|input| replay(input, tracker, Some("import")).unwrap().1)
        .collect()
}

fn open(dir: &TempDir) -> LineageQueryService<SqliteHistoryStore> {
    let store = SqliteHistoryStore::new(dir.path().join("lineage.db")).unwrap();
    LineageQueryService::with_defaults(store)
}

#[tokio::test]
async fn test_ingest_then_query_history() {
    let dir = TempDir::new().unwrap();
    let tracker = LineageTracker::default_config();
    let service = open(&dir);

    let records = replay_all(&tracker);
    assert_eq!(records.len(), 3);

    let receipt = service.batch_store_history(records).await.unwrap();
    assert_eq!(receipt.stored, 3);
    assert_eq!(receipt.duplicates, 0);

    let damage = service.get_field_history::<Value>("ak-47", "damage").await.unwrap();
    assert_eq!(damage.len(), 2);
    assert_eq!(damage.entries[0].source, DataSource::CommunityWiki);
    assert_eq!(damage.entries[0].old_value, None);
    assert_eq!(damage.entries[1].old_value, Some(json!(34)));
    assert_eq!(damage.latest(), Some(&json!(35)));
    assert_eq!(damage.entries[1].reference.as_deref(), Some("patch-1.2"));

    let falloff = service.get_field_history::<Value>("ak-47", "falloff").await.unwrap();
    assert_eq!(falloff.latest(), Some(&json!({ "end": 45, "start": 20 })));
}

#[tokio::test]
async fn test_reingest_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let tracker = LineageTracker::default_config();

    let first = open(&dir).batch_store_history(replay_all(&tracker)).await.unwrap();
    assert_eq!(first.stored, 3);

    // A fresh connection to the same file sees the earlier rows
    let service = open(&dir);
    let second = service.batch_store_history(replay_all(&tracker)).await.unwrap();
    assert_eq!(second.stored, 0);
    assert_eq!(second.duplicates, 3);

    let stats = service
        .query_statistics::<Value>(LineageQueryFilters::for_entity("ak-47"))
        .await
        .unwrap();
    assert_eq!(stats.total_records, 3);
    assert_eq!(stats.unique_fields, 2);
    assert_eq!(stats.by_reason.get("import"), Some(&3));
}

#[test]
fn test_reconcile_uses_configured_reliability() {
    let config = Config::parse(
        r#"
[tracker.reliability]
community_wiki = 0.99
"#,
    )
    .unwrap();
    let tracker = LineageTracker::new(config.tracker).unwrap();

    let inputs = parse_field_inputs(&document()).unwrap();
    let fields = reconcile_inputs(inputs, &tracker, T).unwrap();

    let damage = &fields[0].reconciled;
    assert_eq!(damage.primary_source, DataSource::CommunityWiki);
    assert_eq!(damage.current_value, json!(34));
    assert!(damage.has_conflict);
}
