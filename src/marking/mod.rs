//! Similarity-based marking.
//!
//! An answer and every rubric point are embedded, L2-normalized and compared by
//! cosine similarity. A point is matched when its similarity reaches the lowest
//! configured threshold ([`Thresholds::gate`]); the awarded mark is the number of
//! matched points capped at the rubric's `max_marks`.
//!
//! The full similarity vector and the matched indices are always returned so a
//! reviewer can see why a mark was awarded.
//!
//! # Failure policy
//!
//! Embedding failures, timeouts and malformed embedding output surface as
//! [`MarkingError::EmbeddingUnavailable`] and are never turned into a zero mark.
//! Zero-norm vectors are not failures: they score 0.0 against every point.

pub mod engine;
pub mod error;
pub mod similarity;
pub mod types;


pub use engine::MarkingEngine;
pub use error::{MarkingError, MarkingResult};
pub use similarity::{cosine_similarity, l2_normalize};
pub use types::{GradingResult, MatchDetails, Rubric, RubricEntry, RubricPoint, RubricSet, Thresholds};
