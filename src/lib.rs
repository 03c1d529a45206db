//! Rubric library crate (used by the CLI and integration tests).
//!
//! # Public API Surface
//!
//! ## Marking
//! - [`MarkingEngine`] - Scores answers against a [`Rubric`] by embedding similarity
//! - [`Thresholds`] - Similarity cutoffs; only the lowest gates a match
//! - [`GradingResult`], [`MatchDetails`] - Awarded mark plus per-point evidence
//!
//! ## Batch Grading & Evaluation
//! - [`BatchGrader`] - Grades many submissions, one embedding batch per question
//! - [`Evaluator`], [`EvaluationReport`] - Agreement with teacher-assigned marks
//! - [`CancelHandle`] - Cooperative cancellation between question batches
//!
//! ## Embedding
//! - [`Embedder`] - The `encode(texts) -> vectors` capability
//! - [`SentenceEmbedder`], [`SentenceEmbedderConfig`] - Candle BERT encoder (or stub)
//! - [`SharedEmbedder`] - Lazily loaded, shareable handle
//!
//! ## Records & Configuration
//! - [`DataDir`] - The three JSON record files
//! - [`GraderConfig`] - `RUBRIC_*` environment configuration
//!
//! ## Test/Mock Support
//! [`MockEmbedder`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod dataset;
pub mod embedding;
pub mod evaluation;
pub mod grading;
pub mod marking;

pub use config::{ConfigError, GraderConfig};
pub use constants::{DimValidationError, validate_embedding_dim};
pub use dataset::{DataDir, DatasetError, DatasetResult};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use embedding::{
    Embedder, EmbeddingError, SENTENCE_EMBEDDING_DIM, SENTENCE_MAX_SEQ_LEN, SentenceEmbedder,
    SentenceEmbedderConfig, SharedEmbedder,
};
pub use evaluation::{
    Difference, EvaluationError, EvaluationReport, EvaluationResult, Evaluator, TeacherLabel,
};
pub use grading::{
    BatchGrader, CancelHandle, Cancelled, GradedSubmission, GradingRun, ItemFailure, Submission,
};
pub use marking::{
    GradingResult, MarkingEngine, MarkingError, MarkingResult, MatchDetails, Rubric, RubricEntry,
    RubricPoint, RubricSet, Thresholds, cosine_similarity, l2_normalize,
};
