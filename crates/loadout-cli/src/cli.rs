//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use loadout_domain::traits::LineageQueryFilters;
use loadout_domain::DataSource;

/// Loadout CLI - Reconcile weapon stats across sources and audit their lineage.
#[derive(Debug, Parser)]
#[command(name = "loadout")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "LOADOUT_CONFIG")]
    pub config: Option<String>,

    /// History database path (overrides the configured one)
    #[arg(short, long, global = true, env = "LOADOUT_DB")]
    pub database: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (values only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Reconcile observations into one value per field
    Reconcile(ReconcileArgs),

    /// Replay observations in time order and record every value change
    Ingest(IngestArgs),

    /// Show the change history of an entity or field
    History(HistoryArgs),

    /// Summarize stored history
    Stats(StatsArgs),
}

/// Where to read observation JSON from.
#[derive(Debug, Parser)]
pub struct InputArgs {
    /// JSON file with one field input or an array of them
    #[arg(short = 'i', long)]
    pub file: Option<String>,

    /// Read the JSON from stdin
    #[arg(long)]
    pub stdin: bool,
}

/// Arguments for the reconcile command.
#[derive(Debug, Parser)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Evaluate freshness as of this instant (epoch millis, default: now)
    #[arg(long)]
    pub now: Option<u64>,
}

/// Arguments for the ingest command.
#[derive(Debug, Parser)]
pub struct IngestArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Change reason recorded on every history record
    #[arg(short, long)]
    pub reason: Option<String>,

    /// Print the history records instead of storing them
    #[arg(long)]
    pub dry_run: bool,
}

/// Filters shared by history and stats.
#[derive(Debug, Parser)]
pub struct FilterArgs {
    /// Filter by field name
    #[arg(long)]
    pub field: Option<String>,

    /// Filter by source (e.g. official_api)
    #[arg(short, long)]
    pub source: Option<DataSource>,

    /// Earliest timestamp, inclusive (epoch millis)
    #[arg(long)]
    pub since: Option<u64>,

    /// Latest timestamp, inclusive (epoch millis)
    #[arg(long)]
    pub until: Option<u64>,

    /// Minimum confidence
    #[arg(long)]
    pub min_confidence: Option<f64>,
}

/// Arguments for the history command.
#[derive(Debug, Parser)]
pub struct HistoryArgs {
    /// Weapon id
    pub weapon_id: String,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for the stats command.
#[derive(Debug, Parser)]
pub struct StatsArgs {
    /// Restrict to one weapon id
    pub weapon_id: Option<String>,

    #[command(flatten)]
    pub filters: FilterArgs,
}

impl FilterArgs {
    /// Build query filters for an optional entity.
    pub fn to_filters(&self, weapon_id: Option<String>) -> LineageQueryFilters {
        LineageQueryFilters {
            weapon_id,
            field: self.field.clone(),
            source: self.source,
            start_time: self.since,
            end_time: self.until,
            min_confidence: self.min_confidence,
            limit: None,
        }
    }
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_command() {
        let cli = Cli::parse_from(["loadout", "reconcile", "--file", "obs.json", "--now", "42"]);
        match cli.command {
            Command::Reconcile(args) => {
                assert_eq!(args.input.file.as_deref(), Some("obs.json"));
                assert_eq!(args.now, Some(42));
            }
            _ => panic!("Expected Reconcile command"),
        }
    }

    #[test]
    fn test_history_filters() {
        let cli = Cli::parse_from([
            "loadout",
            "history",
            "ak-47",
            "--field",
            "damage",
            "--source",
            "patch-notes",
            "--since",
            "10",
            "--limit",
            "5",
        ]);
        match cli.command {
            Command::History(args) => {
                let filters = args.filters.to_filters(Some(args.weapon_id.clone()));
                assert_eq!(filters.weapon_id.as_deref(), Some("ak-47"));
                assert_eq!(filters.source, Some(DataSource::PatchNotes));
                assert_eq!(filters.start_time, Some(10));
                assert_eq!(args.limit, Some(5));
            }
            _ => panic!("Expected History command"),
        }
    }

    #[test]
    fn test_unknown_source_rejected() {
        let result = Cli::try_parse_from(["loadout", "stats", "--source", "forum"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["loadout", "stats", "--format", "json", "--verbose", "-d", "x.db"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert!(cli.verbose);
        assert_eq!(cli.database.as_deref(), Some("x.db"));
    }
}
