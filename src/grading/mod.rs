//! Batch grading of many submissions.
//!
//! Submissions are grouped by question so each question's answers and rubric
//! points are embedded in one call each. A submission that cannot be graded
//! becomes an [`ItemFailure`]; it never aborts the rest of the run.

pub mod batch;
pub mod cancel;
pub mod types;


pub use batch::BatchGrader;
pub use cancel::{CancelHandle, Cancelled};
pub use types::{GradedSubmission, GradingRun, ItemFailure, Submission};
