//! Embedding capability.
//!
//! - [`Embedder`] is the seam the marking engine consumes (`encode: texts -> vectors`).
//! - [`sentence`] provides the candle-backed BERT sentence embedder (plus stub mode).
//! - [`shared`] wraps it in a lazily-loaded, cloneable handle.

mod backend;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
/// Sentence embedder (BERT + mean pooling).
pub mod sentence;
/// Lazily-loaded shared embedder.
pub mod shared;
/// Tokenizer loading helpers.
pub mod utils;

pub use backend::{Embedder, validate_output};
pub use error::EmbeddingError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
pub use sentence::{
    SENTENCE_EMBEDDING_DIM, SENTENCE_MAX_SEQ_LEN, SentenceEmbedder, SentenceEmbedderConfig,
};
pub use shared::SharedEmbedder;
