use serde::{Deserialize, Serialize};

use crate::marking::{GradingResult, MarkingError, MatchDetails};

/// One student's answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Student id.
    pub id: String,
    pub qid: String,
    pub answer: String,
}

impl Submission {
    pub fn new(id: impl Into<String>, qid: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            qid: qid.into(),
            answer: answer.into(),
        }
    }
}

/// Grading outcome for one submission, as surfaced to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradedSubmission {
    pub student_id: String,
    pub qid: String,
    pub answer: String,
    pub awarded: u32,
    pub max_marks: u32,
    pub details: MatchDetails,
}

impl GradedSubmission {
    pub fn new(submission: &Submission, result: GradingResult) -> Self {
        Self {
            student_id: submission.id.clone(),
            qid: submission.qid.clone(),
            answer: submission.answer.clone(),
            awarded: result.awarded(),
            max_marks: result.max_marks(),
            details: result.into_details(),
        }
    }
}

/// A submission that could not be graded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub student_id: String,
    pub qid: String,
    /// Machine-readable error code (see [`MarkingError::code`]).
    pub kind: String,
    pub error: String,
}

impl ItemFailure {
    pub fn new(submission: &Submission, error: &MarkingError) -> Self {
        Self {
            student_id: submission.id.clone(),
            qid: submission.qid.clone(),
            kind: error.code().to_string(),
            error: error.to_string(),
        }
    }
}

impl std::fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}: {}", self.student_id, self.qid, self.error)
    }
}

/// Results of grading a batch of submissions.
///
/// `results` and `failures` each keep submission order; every submission appears
/// in exactly one of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GradingRun {
    pub results: Vec<GradedSubmission>,
    pub failures: Vec<ItemFailure>,
}

impl GradingRun {
    pub fn graded(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
