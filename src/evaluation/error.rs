use thiserror::Error;

use crate::grading::Cancelled;

/// Errors that end an evaluation run without a report.
///
/// Per-submission failures are not errors here; they are collected in
/// [`EvaluationReport::failures`](super::EvaluationReport::failures).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("evaluation {0}")]
    Cancelled(#[from] Cancelled),
}

pub type EvaluationResult<T> = Result<T, EvaluationError>;
