use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::constants::DEFAULT_MAX_CONCURRENT_BATCHES;
use crate::embedding::Embedder;
use crate::marking::{GradingResult, MarkingEngine, MarkingResult, RubricSet, Thresholds};

use super::cancel::{CancelHandle, Cancelled};
use super::types::{GradedSubmission, GradingRun, ItemFailure, Submission};

/// Submissions (by index) that share a question and are embedded together.
struct QuestionBatch<'a> {
    qid: &'a str,
    members: Vec<usize>,
}

/// Groups submission indices by question id, in first-appearance order.
fn group_by_question<'a>(submissions: &[&'a Submission]) -> Vec<QuestionBatch<'a>> {
    let mut positions: HashMap<&'a str, usize> = HashMap::new();
    let mut batches: Vec<QuestionBatch<'a>> = Vec::new();

    for (index, &submission) in submissions.iter().enumerate() {
        let qid = submission.qid.as_str();
        match positions.get(qid) {
            Some(&position) => batches[position].members.push(index),
            None => {
                positions.insert(qid, batches.len());
                batches.push(QuestionBatch {
                    qid,
                    members: vec![index],
                });
            }
        }
    }

    batches
}

/// Per-submission outcomes of a (possibly cancelled) batched run.
pub(crate) struct BatchOutcomes {
    indexed: Vec<(usize, MarkingResult<GradingResult>)>,
    processed_batches: usize,
    total_batches: usize,
}

impl BatchOutcomes {
    pub(crate) fn cancelled(&self) -> Cancelled {
        Cancelled {
            processed_batches: self.processed_batches,
            total_batches: self.total_batches,
        }
    }

    /// Outcomes in submission order. Only meaningful for a run that was not cancelled.
    pub(crate) fn into_ordered(mut self) -> Vec<MarkingResult<GradingResult>> {
        self.indexed.sort_by_key(|(index, _)| *index);
        self.indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

/// Grades many submissions, batching embedding calls per question.
///
/// Question batches are independent and run up to `max_concurrent_batches` at a
/// time; within a batch all answers share one embedding call.
pub struct BatchGrader<E: Embedder> {
    engine: MarkingEngine<E>,
    max_concurrent_batches: usize,
}

impl<E: Embedder> std::fmt::Debug for BatchGrader<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchGrader")
            .field("engine", &self.engine)
            .field("max_concurrent_batches", &self.max_concurrent_batches)
            .finish()
    }
}

impl<E: Embedder + 'static> BatchGrader<E> {
    pub fn new(engine: MarkingEngine<E>) -> Self {
        Self {
            engine,
            max_concurrent_batches: DEFAULT_MAX_CONCURRENT_BATCHES,
        }
    }

    /// Sets batch concurrency (values below 1 are raised to 1).
    pub fn with_max_concurrent_batches(mut self, max_concurrent_batches: usize) -> Self {
        self.max_concurrent_batches = max_concurrent_batches.max(1);
        self
    }

    pub fn engine(&self) -> &MarkingEngine<E> {
        &self.engine
    }

    pub fn max_concurrent_batches(&self) -> usize {
        self.max_concurrent_batches
    }

    /// Grades every submission; failures are collected, never fatal to the run.
    #[instrument(skip_all, fields(submissions = submissions.len(), gate = thresholds.gate()))]
    pub async fn grade_all(
        &self,
        rubrics: &RubricSet,
        submissions: &[Submission],
        thresholds: &Thresholds,
    ) -> GradingRun {
        let refs: Vec<&Submission> = submissions.iter().collect();
        let outcomes = self.grade_outcomes(rubrics, &refs, thresholds, None).await;
        build_run(submissions, outcomes.into_ordered())
    }

    /// Like [`grade_all`](Self::grade_all), checking `cancel` between question batches.
    #[instrument(skip_all, fields(submissions = submissions.len(), gate = thresholds.gate()))]
    pub async fn grade_all_with_cancel(
        &self,
        rubrics: &RubricSet,
        submissions: &[Submission],
        thresholds: &Thresholds,
        cancel: &CancelHandle,
    ) -> Result<GradingRun, Cancelled> {
        let refs: Vec<&Submission> = submissions.iter().collect();
        let outcomes = self
            .grade_outcomes(rubrics, &refs, thresholds, Some(cancel))
            .await;

        if cancel.is_cancelled() {
            let cancelled = outcomes.cancelled();
            warn!(%cancelled, "Grading run cancelled, discarding partial results");
            return Err(cancelled);
        }

        Ok(build_run(submissions, outcomes.into_ordered()))
    }

    pub(crate) async fn grade_outcomes(
        &self,
        rubrics: &RubricSet,
        submissions: &[&Submission],
        thresholds: &Thresholds,
        cancel: Option<&CancelHandle>,
    ) -> BatchOutcomes {
        let batches = group_by_question(submissions);
        let total_batches = batches.len();
        let processed = AtomicUsize::new(0);

        debug!(
            total_batches,
            max_concurrent = self.max_concurrent_batches,
            "Grading question batches"
        );

        let per_batch: Vec<Option<Vec<(usize, MarkingResult<GradingResult>)>>> =
            stream::iter(batches)
                .map(|batch| {
                    let processed = &processed;
                    async move {
                        if cancel.is_some_and(CancelHandle::is_cancelled) {
                            return None;
                        }
                        let outcomes = self
                            .grade_batch(rubrics, submissions, &batch, thresholds)
                            .await;
                        processed.fetch_add(1, Ordering::Relaxed);
                        Some(outcomes)
                    }
                })
                .buffered(self.max_concurrent_batches)
                .collect()
                .await;

        BatchOutcomes {
            indexed: per_batch.into_iter().flatten().flatten().collect(),
            processed_batches: processed.load(Ordering::Relaxed),
            total_batches,
        }
    }

    async fn grade_batch(
        &self,
        rubrics: &RubricSet,
        submissions: &[&Submission],
        batch: &QuestionBatch<'_>,
        thresholds: &Thresholds,
    ) -> Vec<(usize, MarkingResult<GradingResult>)> {
        let outcome = match rubrics.rubric(batch.qid) {
            Ok(rubric) => {
                let answers: Vec<&str> = batch
                    .members
                    .iter()
                    .map(|&index| submissions[index].answer.as_str())
                    .collect();
                self.engine.score_many(&answers, &rubric, thresholds).await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(results) => batch
                .members
                .iter()
                .copied()
                .zip(results.into_iter().map(Ok))
                .collect(),
            Err(e) => {
                debug!(qid = batch.qid, members = batch.members.len(), error = %e, "Question batch failed");
                batch
                    .members
                    .iter()
                    .map(|&index| (index, Err(e.clone())))
                    .collect()
            }
        }
    }
}

fn build_run(submissions: &[Submission], outcomes: Vec<MarkingResult<GradingResult>>) -> GradingRun {
    let mut run = GradingRun::default();

    for (submission, outcome) in submissions.iter().zip(outcomes) {
        match outcome {
            Ok(result) => run.results.push(GradedSubmission::new(submission, result)),
            Err(e) => {
                warn!(
                    student_id = %submission.id,
                    qid = %submission.qid,
                    error = %e,
                    "Submission could not be graded"
                );
                run.failures.push(ItemFailure::new(submission, &e));
            }
        }
    }

    info!(
        graded = run.graded(),
        failed = run.failed(),
        "Grading run complete"
    );

    run
}
