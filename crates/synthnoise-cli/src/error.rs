//! Error handling for the synthnoise CLI

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Noising error: {0}")]
    Noise(#[from] synthnoise_core::NoiseError),

    #[error("Unknown dataset '{0}'")]
    UnknownDataset(String),

    #[error("Invalid record on line {line} of {path}: {reason}")]
    Record {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),
}

impl CliError {
    pub fn record<P: Into<String>, R: Into<String>>(path: P, line: usize, reason: R) -> Self {
        CliError::Record {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
