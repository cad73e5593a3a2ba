//! Configuration for timers, collectors and logging
//!
//! Loaded from a TOML file:
//! ```toml
//! [timer]
//! period_ms = 100
//! start_enabled = false
//!
//! [debounce]
//! delay_ms = 250
//! start_enabled = true
//!
//! [logging]
//! level = "info"
//! directory = "/var/log/lull"
//! ```
//! Every field is optional and falls back to its default.

use crate::error::Error;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LullConfig {
    #[serde(default)]
    pub timer: TimerConfig,

    #[serde(default)]
    pub debounce: DebounceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LullConfig {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the timers cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.timer.period_ms == 0 {
            return Err(Error::InvalidConfig {
                key: "timer.period_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.debounce.delay_ms == 0 {
            return Err(Error::InvalidConfig {
                key: "debounce.delay_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.logging.level.trim().is_empty() {
            return Err(Error::InvalidConfig {
                key: "logging.level",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Repeating timer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Tick period in milliseconds (default: 100)
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    /// Start the timer as soon as it is created (default: false)
    #[serde(default)]
    pub start_enabled: bool,
}

impl TimerConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            start_enabled: false,
        }
    }
}

/// Debounce collector settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Quiet period before a batch is delivered, in milliseconds (default: 250)
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Whether trigger collectors accept calls right away (default: true)
    #[serde(default = "default_true")]
    pub start_enabled: bool,
}

impl DebounceConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            start_enabled: true,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG` (default: "info")
    #[serde(default = "default_level")]
    pub level: String,

    /// Write daily-rotated log files here instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: None,
        }
    }
}

fn default_period_ms() -> u64 {
    100
}

fn default_delay_ms() -> u64 {
    250
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
