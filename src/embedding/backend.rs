use std::sync::Arc;

use super::error::EmbeddingError;

/// Text-to-vector capability consumed by the marking engine.
///
/// Implementations must return exactly one vector per input text, all of the same
/// dimension, for every call within a run. Calls are synchronous; async callers run
/// them on the blocking pool.
pub trait Embedder: Send + Sync {
    /// Encodes a batch of texts (one vector per text, in input order).
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Returns the dimension of every vector produced by [`encode`](Self::encode).
    fn embedding_dim(&self) -> usize;
}

impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).encode(texts)
    }

    fn embedding_dim(&self) -> usize {
        (**self).embedding_dim()
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).encode(texts)
    }

    fn embedding_dim(&self) -> usize {
        (**self).embedding_dim()
    }
}

/// Checks one [`Embedder::encode`] output: `expected` vectors, none empty, all
/// components finite.
pub fn validate_output(vectors: &[Vec<f32>], expected: usize) -> Result<(), EmbeddingError> {
    let malformed = |reason: String| Err(EmbeddingError::MalformedOutput { reason });

    if vectors.len() != expected {
        return malformed(format!("expected {} vectors, got {}", expected, vectors.len()));
    }

    if vectors.iter().any(Vec::is_empty) {
        return malformed("embedding returned a zero-length vector".to_string());
    }

    if vectors.iter().flatten().any(|x| !x.is_finite()) {
        return malformed("embedding contains non-finite values".to_string());
    }

    Ok(())
}
