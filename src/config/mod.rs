//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `RUBRIC_*` environment variables;
//! the CLI applies its flags on top.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_EMBED_TIMEOUT_SECS, DEFAULT_MAX_CONCURRENT_BATCHES, DEFAULT_SAMPLE_LIMIT,
};
use crate::dataset::DataDir;
use crate::embedding::SentenceEmbedderConfig;
use crate::marking::Thresholds;

/// Grader configuration loaded from environment variables.
///
/// Use [`GraderConfig::from_env`] to read `RUBRIC_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct GraderConfig {
    /// Directory holding the three record files. Default: `.`.
    pub data_dir: PathBuf,

    /// Sentence-embedding model directory. `None` selects the stub embedder.
    pub model_dir: Option<PathBuf>,

    /// Similarity cutoffs, highest first. Default: `0.85, 0.75, 0.60`.
    pub thresholds: Thresholds,

    /// Bound on each embedding call. Default: 30 s.
    pub embed_timeout: Duration,

    /// Differences kept in an evaluation report. Default: `20`.
    pub sample_limit: usize,

    /// Question batches embedded concurrently. Default: `4`.
    pub max_concurrent_batches: usize,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            model_dir: None,
            thresholds: Thresholds::default(),
            embed_timeout: Duration::from_secs(DEFAULT_EMBED_TIMEOUT_SECS),
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            max_concurrent_batches: DEFAULT_MAX_CONCURRENT_BATCHES,
        }
    }
}

impl GraderConfig {
    const ENV_DATA_DIR: &'static str = "RUBRIC_DATA_DIR";
    const ENV_MODEL_DIR: &'static str = "RUBRIC_MODEL_DIR";
    const ENV_THRESHOLDS: &'static str = "RUBRIC_THRESHOLDS";
    const ENV_EMBED_TIMEOUT_SECS: &'static str = "RUBRIC_EMBED_TIMEOUT_SECS";
    const ENV_SAMPLE_LIMIT: &'static str = "RUBRIC_SAMPLE_LIMIT";
    const ENV_MAX_CONCURRENT_BATCHES: &'static str = "RUBRIC_MAX_CONCURRENT_BATCHES";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let data_dir = Self::parse_path_from_env(Self::ENV_DATA_DIR, defaults.data_dir);
        let model_dir = Self::parse_optional_path_from_env(Self::ENV_MODEL_DIR);
        let thresholds = Self::parse_thresholds_from_env(defaults.thresholds)?;
        let embed_timeout = Self::parse_timeout_from_env(defaults.embed_timeout)?;
        let sample_limit =
            Self::parse_usize_from_env(Self::ENV_SAMPLE_LIMIT, defaults.sample_limit)?;
        let max_concurrent_batches = Self::parse_usize_from_env(
            Self::ENV_MAX_CONCURRENT_BATCHES,
            defaults.max_concurrent_batches,
        )?;

        if max_concurrent_batches == 0 {
            return Err(ConfigError::InvalidConcurrency {
                value: max_concurrent_batches.to_string(),
            });
        }

        Ok(Self {
            data_dir,
            model_dir,
            thresholds,
            embed_timeout,
            sample_limit,
            max_concurrent_batches,
        })
    }

    pub fn with_data_dir<P: Into<PathBuf>>(mut self, data_dir: P) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_model_dir<P: Into<PathBuf>>(mut self, model_dir: P) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_dir(&self.data_dir)?;

        if let Some(ref path) = self.model_dir {
            Self::require_dir(path)?;
        }

        if self.embed_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                value: format!("{:?}", self.embed_timeout),
            });
        }

        if self.max_concurrent_batches == 0 {
            return Err(ConfigError::InvalidConcurrency {
                value: self.max_concurrent_batches.to_string(),
            });
        }

        Ok(())
    }

    pub fn data(&self) -> DataDir {
        DataDir::new(&self.data_dir)
    }

    /// Embedder settings: a model directory if configured, the stub otherwise.
    pub fn embedder_config(&self) -> SentenceEmbedderConfig {
        match self.model_dir {
            Some(ref dir) => SentenceEmbedderConfig::new(dir),
            None => SentenceEmbedderConfig::stub(),
        }
    }

    fn require_dir(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::PathNotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn parse_thresholds_from_env(default: Thresholds) -> Result<Thresholds, ConfigError> {
        match env::var(Self::ENV_THRESHOLDS) {
            Ok(value) => value
                .parse()
                .map_err(|source| ConfigError::InvalidThresholds { value, source }),
            Err(_) => Ok(default),
        }
    }

    fn parse_timeout_from_env(default: Duration) -> Result<Duration, ConfigError> {
        let secs = Self::parse_u64_from_env(Self::ENV_EMBED_TIMEOUT_SECS, default.as_secs())?;
        if secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                value: secs.to_string(),
            });
        }
        Ok(Duration::from_secs(secs))
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_u64_from_env(name: &'static str, default: u64) -> Result<u64, ConfigError> {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::ParseError {
                    name,
                    value,
                    source,
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_usize_from_env(name: &'static str, default: usize) -> Result<usize, ConfigError> {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|source| ConfigError::ParseError {
                    name,
                    value,
                    source,
                }),
            Err(_) => Ok(default),
        }
    }
}
