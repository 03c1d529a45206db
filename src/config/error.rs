//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::marking::MarkingError;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Threshold list is empty, non-numeric, out of range or increasing.
    #[error("invalid thresholds '{value}': {source}")]
    InvalidThresholds {
        value: String,
        #[source]
        source: MarkingError,
    },

    /// Embedding timeout must be at least one second.
    #[error("invalid embedding timeout '{value}': must be greater than 0 seconds")]
    InvalidTimeout { value: String },

    /// At least one question batch must be allowed to run.
    #[error("invalid batch concurrency '{value}': must be at least 1")]
    InvalidConcurrency { value: String },

    /// A numeric environment variable could not be parsed.
    #[error("failed to parse {name}='{value}': {source}")]
    ParseError {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
