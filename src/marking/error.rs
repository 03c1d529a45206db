use thiserror::Error;

/// Errors raised while marking a single answer.
///
/// Every variant that concerns a rubric carries its question id so the offending
/// record can be located.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarkingError {
    #[error("unknown question '{qid}': no rubric with this id")]
    UnknownQuestion { qid: String },

    #[error("embedding unavailable for question '{qid}': {reason}")]
    EmbeddingUnavailable { qid: String, reason: String },

    #[error("malformed rubric for question '{qid}': {reason}")]
    MalformedRubric { qid: String, reason: String },

    #[error("invalid thresholds: {reason}")]
    InvalidThresholds { reason: String },
}

impl MarkingError {
    /// Returns the question id the error refers to, if any.
    pub fn qid(&self) -> Option<&str> {
        match self {
            MarkingError::UnknownQuestion { qid }
            | MarkingError::EmbeddingUnavailable { qid, .. }
            | MarkingError::MalformedRubric { qid, .. } => Some(qid),
            MarkingError::InvalidThresholds { .. } => None,
        }
    }

    /// Returns `true` when the failure comes from the embedding infrastructure
    /// rather than from the input records.
    pub fn is_fatal_infrastructure(&self) -> bool {
        matches!(self, MarkingError::EmbeddingUnavailable { .. })
    }

    /// Returns a stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            MarkingError::UnknownQuestion { .. } => "unknown_question",
            MarkingError::EmbeddingUnavailable { .. } => "embedding_unavailable",
            MarkingError::MalformedRubric { .. } => "malformed_rubric",
            MarkingError::InvalidThresholds { .. } => "invalid_thresholds",
        }
    }
}

/// Convenience result type for marking operations.
pub type MarkingResult<T> = Result<T, MarkingError>;
