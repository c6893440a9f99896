//! Errors reported by the network engine.

use thiserror::Error;

/// Invalid or unreadable network configuration.
///
/// Configuration errors are fatal: an engine is never constructed from a config that fails validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("can't read config file {path}: {source}")]
    Io {
        /// Path of the config file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Config is not valid YAML or has fields of wrong types.
    #[error("can't parse network config: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// Parameter value is out of its allowed range.
    #[error("invalid {param} = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name as written in the config.
        param: &'static str,
        /// Rejected value.
        value: f64,
        /// What the value must satisfy.
        reason: &'static str,
    },
}
