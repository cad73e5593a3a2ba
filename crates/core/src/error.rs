//! Error type for configuration loading
//!
//! The timer and collector primitives never fail; only the configuration
//! layer surfaces errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the lull crates
#[derive(Debug, Error)]
pub enum Error {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for `LullConfig`
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be rendered back to TOML
    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// A config value is out of range
    #[error("invalid config value for {key}: {reason}")]
    InvalidConfig { key: &'static str, reason: String },
}
