//! Agreement measurement against teacher-assigned marks.
//!
//! Only submissions with a matching (student id, qid) label are graded and
//! compared. When nothing overlaps the report has `total == 0` and
//! `accuracy == None`.

pub mod error;
pub mod evaluator;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::{EvaluationError, EvaluationResult};
pub use evaluator::Evaluator;
pub use types::{Difference, EvaluationReport, TeacherLabel};
