use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use super::backend::Embedder;
use super::error::EmbeddingError;

/// Table-driven embedder for tests.
///
/// Known texts return their registered vector; unknown texts return the fallback
/// vector (zeros unless set). Failures, latency and malformed output can be injected.
#[derive(Debug)]
pub struct MockEmbedder {
    dim: usize,
    vectors: RwLock<HashMap<String, Vec<f32>>>,
    fallback: Vec<f32>,
    failure: RwLock<Option<String>>,
    latency: Option<Duration>,
    drop_last_vector: bool,
    calls: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
}

impl MockEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            vectors: RwLock::new(HashMap::new()),
            fallback: vec![0.0; dim],
            failure: RwLock::new(None),
            latency: None,
            drop_last_vector: false,
            calls: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
        }
    }

    pub fn with_vector(self, text: &str, vector: Vec<f32>) -> Self {
        self.insert(text, vector);
        self
    }

    pub fn with_fallback(mut self, vector: Vec<f32>) -> Self {
        self.fallback = vector;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn failing(self, reason: &str) -> Self {
        self.set_failure(Some(reason.to_string()));
        self
    }

    /// Returns one vector fewer than requested on every call.
    pub fn with_malformed_output(mut self) -> Self {
        self.drop_last_vector = true;
        self
    }

    pub fn insert(&self, text: &str, vector: Vec<f32>) {
        self.vectors.write().insert(text.to_string(), vector);
    }

    pub fn set_failure(&self, reason: Option<String>) {
        *self.failure.write() = reason;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().clone()
    }
}

impl Embedder for MockEmbedder {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batch_sizes.lock().push(texts.len());

        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }

        if let Some(reason) = self.failure.read().clone() {
            return Err(EmbeddingError::InferenceFailed { reason });
        }

        let vectors = self.vectors.read();
        let mut out: Vec<Vec<f32>> = texts
            .iter()
            .map(|text| {
                vectors
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| self.fallback.clone())
            })
            .collect();

        if self.drop_last_vector {
            out.pop();
        }

        Ok(out)
    }

    fn embedding_dim(&self) -> usize {
        self.dim
    }
}
