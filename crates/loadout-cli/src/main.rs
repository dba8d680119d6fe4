//! Loadout CLI - Multi-source weapon stat reconciliation and lineage audit.

use anyhow::Context;
use clap::Parser;
use loadout_cli::commands;
use loadout_cli::{Cli, Command, Config, Formatter};
use loadout_query::LineageQueryService;
use loadout_store::SqliteHistoryStore;
use loadout_tracker::LineageTracker;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        let formatter = Formatter::new(loadout_cli::config::OutputFormat::Table, true);
        eprintln!("{}", formatter.error(&format!("{:#}", e)));
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(Path::new(path))
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::load().context("Failed to load config")?,
    };

    // Determine output format and color
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let tracker = LineageTracker::new(config.tracker.clone())?;

    let needs_store = match &cli.command {
        Command::Reconcile(_) => false,
        Command::Ingest(args) => !args.dry_run,
        Command::History(_) | Command::Stats(_) => true,
    };
    let service = if needs_store {
        let path = config.database_path(cli.database.as_deref())?;
        let service = open_service(&path, &config)
            .with_context(|| format!("Failed to open history database {}", path.display()))?;
        Some(service)
    } else {
        None
    };

    match (cli.command, service.as_ref()) {
        (Command::Reconcile(args), _) => {
            commands::execute_reconcile(args, &tracker, &formatter)?;
        }
        (Command::Ingest(args), service) => {
            commands::execute_ingest(args, &tracker, service, &formatter).await?;
        }
        (Command::History(args), Some(service)) => {
            commands::execute_history(args, service, &formatter).await?;
        }
        (Command::Stats(args), Some(service)) => {
            commands::execute_stats(args, service, &formatter).await?;
        }
        (Command::History(_) | Command::Stats(_), None) => {
            anyhow::bail!("History database is not open");
        }
    }

    Ok(())
}

fn open_service(path: &Path, config: &Config) -> loadout_cli::Result<LineageQueryService<SqliteHistoryStore>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let store = SqliteHistoryStore::new(path)?;
    debug!(path = %path.display(), records = store.count()?, "Opened history database");
    Ok(LineageQueryService::new(store, config.query.clone())?)
}
