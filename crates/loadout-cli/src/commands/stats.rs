//! Stats command implementation.

use crate::cli::StatsArgs;
use crate::error::Result;
use crate::output::Formatter;
use loadout_query::LineageQueryService;
use loadout_store::SqliteHistoryStore;
use serde_json::Value;

/// Execute the stats command.
pub async fn execute_stats(
    args: StatsArgs,
    service: &LineageQueryService<SqliteHistoryStore>,
    formatter: &Formatter,
) -> Result<()> {
    let filters = args.filters.to_filters(args.weapon_id);
    let stats = service.query_statistics::<Value>(filters).await?;
    println!("{}", formatter.format_statistics(&stats)?);

    Ok(())
}
