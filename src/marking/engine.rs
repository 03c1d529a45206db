use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::constants::{DEFAULT_EMBED_TIMEOUT, validate_embedding_dim};
use crate::embedding::{Embedder, validate_output};

use super::error::{MarkingError, MarkingResult};
use super::similarity::{capped_award, l2_normalize, matched_indices, similarity_vector};
use super::types::{GradingResult, MatchDetails, Rubric, RubricSet, Thresholds};

/// Scores free-text answers against rubric points by embedding similarity.
///
/// Every embedding call runs on the blocking pool and is bounded by the engine's
/// timeout. A call that times out keeps running in the background but its output
/// is discarded.
pub struct MarkingEngine<E: Embedder> {
    embedder: Arc<E>,
    timeout: Duration,
}

impl<E: Embedder> Clone for MarkingEngine<E> {
    fn clone(&self) -> Self {
        Self {
            embedder: Arc::clone(&self.embedder),
            timeout: self.timeout,
        }
    }
}

impl<E: Embedder> std::fmt::Debug for MarkingEngine<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkingEngine")
            .field("embedding_dim", &self.embedder.embedding_dim())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<E: Embedder + 'static> MarkingEngine<E> {
    pub fn new(embedder: E) -> Self {
        Self::from_shared(Arc::new(embedder))
    }

    pub fn from_shared(embedder: Arc<E>) -> Self {
        Self {
            embedder,
            timeout: DEFAULT_EMBED_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Scores one answer.
    pub async fn score(
        &self,
        answer: &str,
        rubric: &Rubric,
        thresholds: &Thresholds,
    ) -> MarkingResult<GradingResult> {
        self.score_many(&[answer], rubric, thresholds)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MarkingError::EmbeddingUnavailable {
                qid: rubric.qid().to_string(),
                reason: "no result produced for answer".to_string(),
            })
    }

    /// Resolves `qid` in `rubrics`, then scores the answer against it.
    pub async fn score_for_question(
        &self,
        answer: &str,
        rubrics: &RubricSet,
        qid: &str,
        thresholds: &Thresholds,
    ) -> MarkingResult<GradingResult> {
        let rubric = rubrics.rubric(qid)?;
        self.score(answer, &rubric, thresholds).await
    }

    /// Scores several answers to the same question.
    ///
    /// All non-empty answers are embedded in one call and all rubric points in one
    /// call. Empty or whitespace-only answers are not embedded; they report 0.0
    /// against every point and never match, even under a non-positive gate. Results
    /// are returned in `answers` order.
    #[instrument(skip(self, answers, rubric, thresholds), fields(qid = rubric.qid(), answers = answers.len(), points = rubric.points().len()))]
    pub async fn score_many(
        &self,
        answers: &[&str],
        rubric: &Rubric,
        thresholds: &Thresholds,
    ) -> MarkingResult<Vec<GradingResult>> {
        let point_count = rubric.points().len();
        let gate = thresholds.gate();

        let to_embed: Vec<(usize, String)> = answers
            .iter()
            .enumerate()
            .filter(|(_, answer)| !answer.trim().is_empty())
            .map(|(i, answer)| (i, answer.to_string()))
            .collect();

        let mut normalized_answers: Vec<Option<Vec<f32>>> = vec![None; answers.len()];
        let mut normalized_points: Vec<Option<Vec<f32>>> = vec![None; point_count];

        if point_count > 0 && !to_embed.is_empty() {
            let texts: Vec<String> = to_embed.iter().map(|(_, text)| text.clone()).collect();
            let answer_vectors = self.encode(rubric.qid(), texts).await?;
            let point_vectors = self.encode(rubric.qid(), rubric.point_texts()).await?;

            check_dimensions(rubric.qid(), &answer_vectors, &point_vectors)?;

            for ((index, _), vector) in to_embed.iter().zip(&answer_vectors) {
                normalized_answers[*index] = l2_normalize(vector);
            }
            normalized_points = point_vectors.iter().map(|v| l2_normalize(v)).collect();

            let degenerate = normalized_points.iter().filter(|p| p.is_none()).count();
            if degenerate > 0 {
                warn!(
                    qid = rubric.qid(),
                    degenerate, "Zero-norm rubric point embeddings can never match"
                );
            }
        }

        let results = normalized_answers
            .iter()
            .map(|answer| {
                let scored = similarity_vector(answer.as_deref(), &normalized_points);
                let matched = matched_indices(&scored, gate);
                let awarded = capped_award(matched.len(), rubric.max_marks());

                GradingResult::new(
                    awarded,
                    rubric.max_marks(),
                    MatchDetails {
                        similarities: scored.iter().map(|sim| sim.unwrap_or(0.0)).collect(),
                        matched_indices: matched,
                    },
                )
            })
            .collect::<Vec<_>>();

        debug!(
            gate,
            awarded = ?results.iter().map(GradingResult::awarded).collect::<Vec<_>>(),
            max_marks = rubric.max_marks(),
            "Answers scored"
        );

        Ok(results)
    }

    /// Runs one bounded embedding call and validates its output.
    async fn encode(&self, qid: &str, texts: Vec<String>) -> MarkingResult<Vec<Vec<f32>>> {
        let expected = texts.len();
        let embedder = Arc::clone(&self.embedder);
        let task = tokio::task::spawn_blocking(move || embedder.encode(&texts));

        let unavailable = |reason: String| MarkingError::EmbeddingUnavailable {
            qid: qid.to_string(),
            reason,
        };

        let vectors = match tokio::time::timeout(self.timeout, task).await {
            Err(_) => {
                warn!(qid, timeout = ?self.timeout, "Embedding call timed out");
                return Err(unavailable(format!(
                    "embedding timed out after {:?}",
                    self.timeout
                )));
            }
            Ok(Err(join_err)) => {
                return Err(unavailable(format!("embedding task failed: {}", join_err)));
            }
            Ok(Ok(Err(e))) => return Err(unavailable(e.to_string())),
            Ok(Ok(Ok(vectors))) => vectors,
        };

        validate_output(&vectors, expected).map_err(|e| unavailable(e.to_string()))?;

        Ok(vectors)
    }
}

/// Every vector from both calls must share one dimension.
fn check_dimensions(qid: &str, answers: &[Vec<f32>], points: &[Vec<f32>]) -> MarkingResult<()> {
    let Some(expected) = answers.first().or(points.first()).map(Vec::len) else {
        return Ok(());
    };

    for vector in answers.iter().chain(points) {
        validate_embedding_dim(vector.len(), expected).map_err(|e| {
            MarkingError::EmbeddingUnavailable {
                qid: qid.to_string(),
                reason: e.to_string(),
            }
        })?;
    }

    Ok(())
}
