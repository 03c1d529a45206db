//! Lazily-loaded, process-shared sentence embedder.
//!
//! Loading the encoder is the expensive step, so a [`SharedEmbedder`] defers it to the
//! first [`encode`](Embedder::encode) call and keeps the loaded model for every clone.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use super::backend::Embedder;
use super::error::EmbeddingError;
use super::sentence::{SentenceEmbedder, SentenceEmbedderConfig};

struct SharedInner {
    config: SentenceEmbedderConfig,
    slot: Mutex<Option<Arc<SentenceEmbedder>>>,
}

/// Cloneable handle to a sentence embedder that is loaded on first use.
///
/// A failed load is returned to the caller and retried on the next call.
#[derive(Clone)]
pub struct SharedEmbedder {
    inner: Arc<SharedInner>,
}

impl std::fmt::Debug for SharedEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedEmbedder")
            .field("config", &self.inner.config)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl SharedEmbedder {
    /// Creates an unloaded handle.
    pub fn new(config: SentenceEmbedderConfig) -> Self {
        Self {
            inner: Arc::new(SharedInner {
                config,
                slot: Mutex::new(None),
            }),
        }
    }

    /// Returns the loaded embedder, loading it now if needed.
    pub fn get(&self) -> Result<Arc<SentenceEmbedder>, EmbeddingError> {
        // The lock is held across the load so concurrent first callers load once.
        let mut slot = self.inner.slot.lock();
        if let Some(embedder) = slot.as_ref() {
            return Ok(Arc::clone(embedder));
        }

        info!(
            model_dir = %self.inner.config.model_dir.display(),
            stub = self.inner.config.testing_stub,
            "Loading sentence embedder on first use"
        );

        let embedder = match SentenceEmbedder::load(self.inner.config.clone()) {
            Ok(embedder) => Arc::new(embedder),
            Err(e) => {
                warn!(error = %e, "Sentence embedder failed to load");
                return Err(e);
            }
        };

        *slot = Some(Arc::clone(&embedder));
        Ok(embedder)
    }

    /// Returns `true` once the model has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.inner.slot.lock().is_some()
    }

    /// Returns the config the model is (or will be) loaded from.
    pub fn config(&self) -> &SentenceEmbedderConfig {
        &self.inner.config
    }
}

impl Embedder for SharedEmbedder {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.get()?.encode(texts)
    }

    fn embedding_dim(&self) -> usize {
        self.inner.config.embedding_dim
    }
}
