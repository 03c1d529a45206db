use serde::{Deserialize, Serialize};

use crate::grading::ItemFailure;

/// Teacher-assigned mark for one (student, question) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherLabel {
    pub student_id: String,
    pub qid: String,
    pub teacher_mark: i64,
}

impl TeacherLabel {
    pub fn new(student_id: impl Into<String>, qid: impl Into<String>, teacher_mark: i64) -> Self {
        Self {
            student_id: student_id.into(),
            qid: qid.into(),
            teacher_mark,
        }
    }
}

/// Awarded mark next to the teacher's mark for one compared submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    pub student_id: String,
    pub qid: String,
    pub awarded: u32,
    pub teacher: i64,
}

impl Difference {
    /// Exact integer agreement; there is no tolerance band.
    pub fn agrees(&self) -> bool {
        i64::from(self.awarded) == self.teacher
    }
}

/// Agreement between automated and teacher marks over the labeled submissions.
///
/// `total` and `correct` cover every compared submission; `differences` is only
/// the first `sample_limit` of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub total: usize,
    pub correct: usize,
    /// `None` when nothing was compared.
    pub accuracy: Option<f64>,
    pub differences: Vec<Difference>,
    /// Submissions without a teacher label.
    pub skipped: usize,
    /// Labeled submissions that could not be graded. Not counted in `total`.
    pub failures: Vec<ItemFailure>,
}

impl EvaluationReport {
    pub fn has_labeled_data(&self) -> bool {
        self.total > 0
    }

    /// Sampled differences where the marks disagree.
    pub fn mismatches(&self) -> impl Iterator<Item = &Difference> {
        self.differences.iter().filter(|d| !d.agrees())
    }

    /// Human-readable result block.
    pub fn summary(&self) -> String {
        let accuracy = match self.accuracy {
            Some(accuracy) => format!("Exact match accuracy: {:.3}", accuracy),
            None => "No matching teacher labels found".to_string(),
        };

        format!(
            "Evaluation Results\n\
             ==================\n\
             Total compared: {}\n\
             {}\n\
             Skipped (no teacher label): {}\n\
             Failed to grade: {}",
            self.total,
            accuracy,
            self.skipped,
            self.failures.len()
        )
    }
}

impl std::fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}
