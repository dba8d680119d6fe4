//! Ingest command implementation.

use crate::cli::IngestArgs;
use crate::commands::{read_field_inputs, FieldInput};
use crate::error::Result;
use crate::output::Formatter;
use loadout_domain::{LineageHistoryRecord, MultiSourceField};
use loadout_query::LineageQueryService;
use loadout_store::SqliteHistoryStore;
use loadout_tracker::LineageTracker;
use serde_json::Value;
use tracing::{debug, info};

/// Execute the ingest command.
pub async fn execute_ingest(
    args: IngestArgs,
    tracker: &LineageTracker,
    service: Option<&LineageQueryService<SqliteHistoryStore>>,
    formatter: &Formatter,
) -> Result<()> {
    let inputs = read_field_inputs(&args.input)?;

    let mut records = Vec::new();
    for input in inputs {
        let (_, changes) = replay(input, tracker, args.reason.as_deref())?;
        records.extend(changes);
    }
    info!(records = records.len(), "Replayed observations");

    let service = match service {
        Some(service) if !args.dry_run => service,
        _ => {
            println!("{}", formatter.format_history(&records)?);
            return Ok(());
        }
    };

    if records.is_empty() {
        println!("{}", formatter.warning("No value changes to record"));
        return Ok(());
    }

    let chunk_size = service.config().max_batch_size;
    for chunk in records.chunks(chunk_size) {
        let receipt = service.batch_store_history(chunk.to_vec()).await?;
        println!("{}", formatter.format_receipt(&receipt)?);
    }

    Ok(())
}

/// Replay one field's observations in time order
///
/// The first observation creates the field; each later one goes through
/// `add_or_update_source` as of its own timestamp. A history record is
/// produced for the first value and for every change of the current value,
/// stamped with the observation time that caused it.
pub fn replay(
    input: FieldInput,
    tracker: &LineageTracker,
    reason: Option<&str>,
) -> Result<(Option<MultiSourceField<Value>>, Vec<LineageHistoryRecord<Value>>)> {
    let FieldInput {
        weapon_id,
        field,
        mut observations,
    } = input;
    observations.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.source.cmp(&b.source)));

    let mut current: Option<MultiSourceField<Value>> = None;
    let mut changes = Vec::new();

    for observation in observations {
        let at = observation.timestamp;
        let reference = observation.reference.clone();
        let updated = match &current {
            None => tracker.create_multi_source_field_at(vec![observation], &field, at)?,
            Some(existing) => tracker.add_or_update_source_at(existing, observation, &field, at)?,
        };

        if let Some(record) = tracker.record_change(
            &weapon_id,
            &field,
            current.as_ref(),
            &updated,
            reason.map(str::to_string),
            reference,
            at,
        ) {
            debug!(weapon_id = %weapon_id, field = %field, at, "Recorded value change");
            changes.push(record);
        }
        current = Some(updated);
    }

    Ok((current, changes))
}
