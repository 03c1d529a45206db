use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};

use crate::constants::DEFAULT_SAMPLE_LIMIT;
use crate::embedding::Embedder;
use crate::grading::{BatchGrader, CancelHandle, ItemFailure, Submission};
use crate::marking::{GradingResult, MarkingEngine, MarkingResult, RubricSet, Thresholds};

use super::error::EvaluationResult;
use super::types::{Difference, EvaluationReport, TeacherLabel};

type LabelKey<'a> = (&'a str, &'a str);

/// Indexes labels by (student id, qid). A later duplicate replaces an earlier one.
fn index_labels(labels: &[TeacherLabel]) -> HashMap<LabelKey<'_>, i64> {
    labels
        .iter()
        .map(|label| ((label.student_id.as_str(), label.qid.as_str()), label.teacher_mark))
        .collect()
}

/// Runs the marking engine over labeled submissions and measures agreement.
pub struct Evaluator<E: Embedder> {
    grader: BatchGrader<E>,
    sample_limit: usize,
}

impl<E: Embedder> std::fmt::Debug for Evaluator<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("grader", &self.grader)
            .field("sample_limit", &self.sample_limit)
            .finish()
    }
}

impl<E: Embedder + 'static> Evaluator<E> {
    pub fn new(engine: MarkingEngine<E>) -> Self {
        Self::from_grader(BatchGrader::new(engine))
    }

    pub fn from_grader(grader: BatchGrader<E>) -> Self {
        Self {
            grader,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }

    /// Bounds `differences` in the report; totals are unaffected.
    pub fn with_sample_limit(mut self, sample_limit: usize) -> Self {
        self.sample_limit = sample_limit;
        self
    }

    pub fn with_max_concurrent_batches(mut self, max_concurrent_batches: usize) -> Self {
        self.grader = self.grader.with_max_concurrent_batches(max_concurrent_batches);
        self
    }

    pub fn grader(&self) -> &BatchGrader<E> {
        &self.grader
    }

    pub fn sample_limit(&self) -> usize {
        self.sample_limit
    }

    /// Compares awarded marks against teacher labels.
    ///
    /// Submissions without a label are counted in `skipped` and never graded.
    /// Submissions that fail to grade are listed in `failures` and excluded from
    /// `total`.
    #[instrument(skip_all, fields(submissions = submissions.len(), labels = labels.len()))]
    pub async fn evaluate(
        &self,
        rubrics: &RubricSet,
        submissions: &[Submission],
        labels: &[TeacherLabel],
        thresholds: &Thresholds,
    ) -> EvaluationReport {
        let label_map = index_labels(labels);
        let (labeled, skipped) = split_labeled(submissions, &label_map);

        let outcomes = self
            .grader
            .grade_outcomes(rubrics, &labeled, thresholds, None)
            .await;

        self.build_report(&labeled, outcomes.into_ordered(), &label_map, skipped)
    }

    /// Like [`evaluate`](Self::evaluate), but stops between question batches once
    /// `cancel` fires. A cancelled run yields no report.
    #[instrument(skip_all, fields(submissions = submissions.len(), labels = labels.len()))]
    pub async fn evaluate_with_cancel(
        &self,
        rubrics: &RubricSet,
        submissions: &[Submission],
        labels: &[TeacherLabel],
        thresholds: &Thresholds,
        cancel: &CancelHandle,
    ) -> EvaluationResult<EvaluationReport> {
        let label_map = index_labels(labels);
        let (labeled, skipped) = split_labeled(submissions, &label_map);

        let outcomes = self
            .grader
            .grade_outcomes(rubrics, &labeled, thresholds, Some(cancel))
            .await;

        if cancel.is_cancelled() {
            let cancelled = outcomes.cancelled();
            warn!(%cancelled, "Evaluation cancelled, discarding partial totals");
            return Err(cancelled.into());
        }

        Ok(self.build_report(&labeled, outcomes.into_ordered(), &label_map, skipped))
    }

    fn build_report(
        &self,
        labeled: &[&Submission],
        outcomes: Vec<MarkingResult<GradingResult>>,
        label_map: &HashMap<LabelKey<'_>, i64>,
        skipped: usize,
    ) -> EvaluationReport {
        let mut report = EvaluationReport {
            skipped,
            ..EvaluationReport::default()
        };

        for (&submission, outcome) in labeled.iter().zip(outcomes) {
            let result = match outcome {
                Ok(result) => result,
                Err(e) => {
                    warn!(
                        student_id = %submission.id,
                        qid = %submission.qid,
                        error = %e,
                        "Labeled submission could not be graded"
                    );
                    report.failures.push(ItemFailure::new(submission, &e));
                    continue;
                }
            };

            let Some(&teacher) = label_map.get(&(submission.id.as_str(), submission.qid.as_str()))
            else {
                continue;
            };

            let difference = Difference {
                student_id: submission.id.clone(),
                qid: submission.qid.clone(),
                awarded: result.awarded(),
                teacher,
            };

            report.total += 1;
            if difference.agrees() {
                report.correct += 1;
            }
            if report.differences.len() < self.sample_limit {
                report.differences.push(difference);
            }
        }

        report.accuracy =
            (report.total > 0).then(|| report.correct as f64 / report.total as f64);

        info!(
            total = report.total,
            correct = report.correct,
            accuracy = ?report.accuracy,
            skipped = report.skipped,
            failed = report.failures.len(),
            "Evaluation complete"
        );

        report
    }
}

/// Keeps submissions that have a teacher label and counts the rest.
fn split_labeled<'a>(
    submissions: &'a [Submission],
    label_map: &HashMap<LabelKey<'_>, i64>,
) -> (Vec<&'a Submission>, usize) {
    let labeled: Vec<&Submission> = submissions
        .iter()
        .filter(|s| label_map.contains_key(&(s.id.as_str(), s.qid.as_str())))
        .collect();
    let skipped = submissions.len() - labeled.len();

    if skipped > 0 {
        debug!(skipped, "Submissions without a teacher label are not graded");
    }

    (labeled, skipped)
}
