//! Reconcile command implementation.

use crate::cli::ReconcileArgs;
use crate::commands::{read_field_inputs, FieldInput};
use crate::error::Result;
use crate::output::{Formatter, ReconciledField};
use loadout_domain::clock::now_millis;
use loadout_tracker::LineageTracker;

/// Execute the reconcile command.
pub fn execute_reconcile(args: ReconcileArgs, tracker: &LineageTracker, formatter: &Formatter) -> Result<()> {
    let inputs = read_field_inputs(&args.input)?;
    let now = args.now.unwrap_or_else(now_millis);

    let fields = reconcile_inputs(inputs, tracker, now)?;
    println!("{}", formatter.format_fields(&fields)?);

    Ok(())
}

/// Reconcile every input from scratch as of `now`.
pub fn reconcile_inputs(inputs: Vec<FieldInput>, tracker: &LineageTracker, now: u64) -> Result<Vec<ReconciledField>> {
    inputs
        .into_iter()
        .map(|input| -> Result<ReconciledField> {
            let reconciled = tracker.create_multi_source_field_at(input.observations, &input.field, now)?;
            Ok(ReconciledField {
                weapon_id: input.weapon_id,
                field: input.field,
                reconciled,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::parse_field_inputs;
    use crate::error::CliError;
    use loadout_domain::{DataSource, LineageError};
    use serde_json::json;

    #[test]
    fn test_reconcile_composite_values() {
        let inputs = parse_field_inputs(
            r#"{
                "weapon_id": "m4",
                "field": "falloff",
                "observations": [
                    { "source": "data_mine", "value": {"start": 20, "end": 45}, "timestamp": 100 },
                    { "source": "community_wiki", "value": {"end": 45, "start": 20}, "timestamp": 90 }
                ]
            }"#,
        )
        .unwrap();

        let fields = reconcile_inputs(inputs, &LineageTracker::default_config(), 100).unwrap();
        let field = &fields[0].reconciled;
        assert_eq!(field.primary_source, DataSource::DataMine);
        assert_eq!(field.current_value, json!({"start": 20, "end": 45}));
        assert!(!field.has_conflict, "Key order does not make values distinct");
    }

    #[test]
    fn test_ambiguous_input_is_an_error() {
        let inputs = parse_field_inputs(
            r#"{
                "weapon_id": "m4",
                "field": "damage",
                "observations": [
                    { "source": "curator", "value": 30, "timestamp": 100 },
                    { "source": "curator", "value": 31, "timestamp": 100 }
                ]
            }"#,
        )
        .unwrap();

        let err = reconcile_inputs(inputs, &LineageTracker::default_config(), 100).unwrap_err();
        match err {
            CliError::Tracker(e) => assert!(matches!(
                e.as_lineage(),
                Some(LineageError::AmbiguousObservation { .. })
            )),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
