//! Cross-cutting, shared constants.
//!
//! Prefer deriving secondary constants from primary ones to avoid drift.
//!
//! # Threshold Invariants
//!
//! Threshold sequences are ordered highest first. Only the last (most lenient) value
//! gates whether a rubric point counts as matched; the higher values are carried
//! through unchanged so callers can report confidence bands.

use std::time::Duration;

/// Output dimension of all-MiniLM-L6-v2.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Tokens kept per input before truncation.
pub const DEFAULT_MAX_SEQ_LEN: usize = 256;

/// Default similarity cutoffs, highest first.
pub const DEFAULT_THRESHOLDS: [f32; 3] = [0.85, 0.75, 0.60];

/// Lowest default cutoff (the one that gates scoring).
pub const DEFAULT_GATE_THRESHOLD: f32 = DEFAULT_THRESHOLDS[DEFAULT_THRESHOLDS.len() - 1];

/// Number of per-submission differences exposed by an evaluation report.
pub const DEFAULT_SAMPLE_LIMIT: usize = 20;

/// Upper bound on a single embedding call.
pub const DEFAULT_EMBED_TIMEOUT_SECS: u64 = 30;

/// [`DEFAULT_EMBED_TIMEOUT_SECS`] as a [`Duration`].
pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(DEFAULT_EMBED_TIMEOUT_SECS);

/// Question batches embedded concurrently during a grading or evaluation run.
pub const DEFAULT_MAX_CONCURRENT_BATCHES: usize = 4;

/// File names of the record store the CLI reads.
pub const MODEL_ANSWERS_FILE: &str = "model_answers.json";
/// Student submissions file.
pub const STUDENT_ANSWERS_FILE: &str = "student_answers.json";
/// Teacher labels file.
pub const TEACHER_LABELS_FILE: &str = "teacher_labels.json";

/// Error returned when an embedding's dimension does not match what a run expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimValidationError {
    /// Embedding dimension cannot be zero.
    ZeroDimension,
    /// Runtime dimension does not match expected dimension.
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DimValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "embedding dimension cannot be zero"),
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for DimValidationError {}

/// Validates that a runtime embedding dimension matches the expected dimension.
///
/// # Example
///
/// ```
/// use rubric::constants::{validate_embedding_dim, DEFAULT_EMBEDDING_DIM};
///
/// validate_embedding_dim(384, DEFAULT_EMBEDDING_DIM).unwrap();
/// assert!(validate_embedding_dim(0, 0).is_err());
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if actual == 0 {
        return Err(DimValidationError::ZeroDimension);
    }
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds_are_non_increasing() {
        assert!(DEFAULT_THRESHOLDS.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(DEFAULT_GATE_THRESHOLD, 0.60);
    }

    #[test]
    fn test_default_timeout_matches_secs() {
        assert_eq!(DEFAULT_EMBED_TIMEOUT.as_secs(), DEFAULT_EMBED_TIMEOUT_SECS);
    }

    #[test]
    fn test_validate_embedding_dim_match() {
        assert!(validate_embedding_dim(384, 384).is_ok());
    }

    #[test]
    fn test_validate_embedding_dim_zero() {
        assert_eq!(
            validate_embedding_dim(0, 384),
            Err(DimValidationError::ZeroDimension)
        );
    }

    #[test]
    fn test_validate_embedding_dim_mismatch() {
        assert_eq!(
            validate_embedding_dim(768, 384),
            Err(DimValidationError::DimensionMismatch {
                expected: 384,
                actual: 768
            })
        );
    }

    #[test]
    fn test_error_display() {
        let err = DimValidationError::ZeroDimension;
        assert_eq!(err.to_string(), "embedding dimension cannot be zero");

        let err = DimValidationError::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        assert!(err.to_string().contains("384"));
        assert!(err.to_string().contains("768"));
    }
}
