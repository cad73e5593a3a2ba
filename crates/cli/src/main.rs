//! Lull CLI - lull command

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lull_core::LullConfig;
use std::path::PathBuf;

mod cmd;
mod logging;

/// Lull - trailing-edge debounce and timer playground
#[derive(Parser)]
#[command(name = "lull")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML config file (default: built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, overrides RUST_LOG and the config (e.g. "debug")
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a repeating timer for a number of ticks
    Tick {
        /// Tick period in ms (default: timer.period_ms from config)
        #[arg(long)]
        period_ms: Option<u64>,
        /// Number of ticks before the timer stops itself
        #[arg(long, default_value = "5")]
        count: u32,
        /// Use virtual time instead of the wall clock
        #[arg(long = "virtual")]
        virtual_time: bool,
    },
    /// Issue triggers at fixed offsets and print the debounced batches
    Trigger {
        /// Quiet period in ms (default: debounce.delay_ms from config)
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Comma-separated trigger offsets in ms
        #[arg(long, value_delimiter = ',', default_value = "0")]
        at: Vec<u64>,
        /// Start with the collector disabled
        #[arg(long)]
        disabled: bool,
        /// Use virtual time instead of the wall clock
        #[arg(long = "virtual")]
        virtual_time: bool,
    },
    /// Debounce stdin lines and print each batch
    Stdin {
        /// Quiet period in ms (default: debounce.delay_ms from config)
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Event name lines are emitted under
        #[arg(long, default_value = "line")]
        event: String,
    },
    /// Show the effective configuration
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LullConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => LullConfig::default(),
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = logging::init(&config.logging, cli.log_level.as_deref())?;

    match cli.command {
        Commands::Tick { period_ms, count, virtual_time } => {
            cmd::tick::run(&config, period_ms, count, virtual_time).await
        }
        Commands::Trigger { delay_ms, at, disabled, virtual_time } => {
            cmd::trigger::run(&config, delay_ms, at, disabled, virtual_time).await
        }
        Commands::Stdin { delay_ms, event } => cmd::stdin::run(&config, delay_ms, &event).await,
        Commands::Config => cmd::config::run(&config, cli.config.as_deref()),
    }
}
