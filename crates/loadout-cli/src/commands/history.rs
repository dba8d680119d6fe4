//! History command implementation.

use crate::cli::HistoryArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use loadout_domain::LineageHistoryRecord;
use loadout_query::LineageQueryService;
use loadout_store::SqliteHistoryStore;
use serde_json::Value;

/// Execute the history command.
pub async fn execute_history(
    args: HistoryArgs,
    service: &LineageQueryService<SqliteHistoryStore>,
    formatter: &Formatter,
) -> Result<()> {
    if let Some(min_conf) = args.filters.min_confidence {
        if !(0.0..=1.0).contains(&min_conf) {
            return Err(CliError::InvalidInput(
                "Confidence must be between 0.0 and 1.0".to_string(),
            ));
        }
    }

    let mut filters = args.filters.to_filters(Some(args.weapon_id));
    filters.limit = args.limit;

    let records: Vec<LineageHistoryRecord<Value>> = service.query_history(filters).await?;
    println!("{}", formatter.format_history(&records)?);

    Ok(())
}
