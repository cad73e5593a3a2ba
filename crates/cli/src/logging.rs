//! Tracing subscriber setup
//!
//! Filter precedence: `--log-level`, then `RUST_LOG`, then `logging.level`.
//! Logs go to stderr unless `logging.directory` is set, in which case they
//! are written to a daily-rotated `lull.log` there.

use anyhow::{Context, Result};
use lull_core::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// Returns the appender guard when logging to files; drop it last.
pub fn init(config: &LoggingConfig, level_override: Option<&str>) -> Result<Option<WorkerGuard>> {
    let filter = match level_override {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid --log-level filter: {}", level))?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .with_context(|| format!("Invalid logging.level filter: {}", config.level))?,
    };

    match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory).with_context(|| {
                format!("Failed to create log directory {}", directory.display())
            })?;
            let appender = tracing_appender::rolling::daily(directory, "lull.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}
