//! Command implementations.

pub mod history;
pub mod ingest;
pub mod reconcile;
pub mod stats;

pub use self::history::execute_history;
pub use self::ingest::execute_ingest;
pub use self::reconcile::execute_reconcile;
pub use self::stats::execute_stats;

use crate::cli::InputArgs;
use crate::error::{CliError, Result};
use loadout_domain::SourceRecord;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::{self, Read};

/// Observations of one field of one weapon, as read from JSON.
///
/// ```json
/// {
///   "weapon_id": "ak-47",
///   "field": "damage",
///   "observations": [
///     { "source": "official_api", "value": 35, "timestamp": 1700000000000 },
///     { "source": "community_wiki", "value": 34, "timestamp": 1699990000000,
///       "reference": "https://wiki.example/ak-47" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct FieldInput {
    /// Weapon id
    pub weapon_id: String,
    /// Field name
    pub field: String,
    /// Source observations
    pub observations: Vec<SourceRecord<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputDocument {
    Many(Vec<FieldInput>),
    One(FieldInput),
}

/// Parse one field input or an array of them.
pub fn parse_field_inputs(json: &str) -> Result<Vec<FieldInput>> {
    let inputs = match serde_json::from_str::<InputDocument>(json)? {
        InputDocument::Many(inputs) => inputs,
        InputDocument::One(input) => vec![input],
    };

    if inputs.is_empty() {
        return Err(CliError::InvalidInput("No fields provided".to_string()));
    }
    for input in &inputs {
        if input.weapon_id.trim().is_empty() || input.field.trim().is_empty() {
            return Err(CliError::InvalidInput(
                "weapon_id and field must not be empty".to_string(),
            ));
        }
        if input.observations.is_empty() {
            return Err(CliError::InvalidInput(format!(
                "{}/{} has no observations",
                input.weapon_id, input.field
            )));
        }
    }

    Ok(inputs)
}

/// Read field inputs from a file or stdin.
pub fn read_field_inputs(args: &InputArgs) -> Result<Vec<FieldInput>> {
    let json_data = if args.stdin {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else if let Some(file_path) = &args.file {
        fs::read_to_string(file_path)?
    } else {
        return Err(CliError::InvalidInput(
            "Must specify either --file or --stdin".to_string(),
        ));
    };

    parse_field_inputs(&json_data)
}
