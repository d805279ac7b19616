mod commands;
mod render;
mod utils;

use anyhow::{Context, Result};
use calsync_core::SyncConfig;
use calsync_core::adapter::{Provider, ProviderAdapter};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "calsync")]
#[command(about = "Block time across your calendars with placeholder events")]
struct Cli {
    /// Debug logging and every planned action instead of per-calendar counts
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Calendar backend to use instead of the configured one (e.g. "eventkit")
    #[arg(long, global = true)]
    provider: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every calendar the backend can see
    ListCalendars,
    /// Choose which calendars participate
    Configure,
    /// Mirror busy time between the participating calendars
    Sync {
        /// Days ahead to look at (defaults to the configured value)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        days: Option<u32>,

        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the current configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = SyncConfig::load().context("Could not load configuration")?;
    let provider = Provider::from_name(cli.provider.as_deref().unwrap_or(&config.provider));
    let adapter = ProviderAdapter::new(provider);

    match cli.command {
        Commands::ListCalendars => commands::list_calendars::run(&adapter, &config).await,
        Commands::Configure => commands::configure::run(&adapter, config).await,
        Commands::Sync { days, dry_run } => {
            require_configured(&config)?;
            commands::sync::run(adapter, &config, days, dry_run, cli.verbose).await
        }
        Commands::Status => commands::status::run(&config),
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the verbosity flag.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn require_configured(config: &SyncConfig) -> Result<()> {
    if !config.is_configured() {
        anyhow::bail!(
            "No calendars configured.\n\n\
            Pick the calendars to keep in sync with:\n  \
            calsync configure"
        );
    }

    Ok(())
}
