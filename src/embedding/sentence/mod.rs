//! Sentence embedder (BERT encoder + mean pooling).
//!
//! Use [`SentenceEmbedderConfig::stub`] for tests/examples without model files.

/// Sentence embedder configuration.
pub mod config;
pub(crate) mod model;


pub use config::{SENTENCE_EMBEDDING_DIM, SENTENCE_MAX_SEQ_LEN, SentenceEmbedderConfig};

use std::sync::Arc;

use candle_core::{Device, Tensor};
use tracing::{debug, info, warn};

use crate::embedding::backend::Embedder;
use crate::embedding::device::select_device;
use crate::embedding::error::EmbeddingError;
use crate::embedding::utils::load_batch_tokenizer;

use model::MeanPooledBert;

enum EmbedderBackend {
    Model {
        model: Arc<MeanPooledBert>,
        tokenizer: Arc<tokenizers::Tokenizer>,
        device: Device,
    },
    Stub,
}

/// Embedding generator for rubric points and answers (supports stub mode).
pub struct SentenceEmbedder {
    backend: EmbedderBackend,
    config: SentenceEmbedderConfig,
}

impl std::fmt::Debug for SentenceEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceEmbedder")
            .field(
                "backend",
                &match &self.backend {
                    EmbedderBackend::Model { device, .. } => format!("Model({:?})", device),
                    EmbedderBackend::Stub => "Stub".to_string(),
                },
            )
            .field("embedding_dim", &self.config.embedding_dim)
            .field("max_seq_len", &self.config.max_seq_len)
            .finish()
    }
}

impl SentenceEmbedder {
    /// Loads the embedder from a config (stub mode is supported).
    pub fn load(config: SentenceEmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!("Sentence embedder running in STUB mode (lexical hashing, testing only)");
            return Ok(Self {
                backend: EmbedderBackend::Stub,
                config,
            });
        }

        let device = select_device()?;
        debug!(?device, "Selected compute device for sentence embedder");

        let tokenizer = load_batch_tokenizer(&config.model_dir, config.max_seq_len).map_err(
            |e| EmbeddingError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            },
        )?;

        let model = MeanPooledBert::load(&config.model_dir, &device).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to load BERT encoder: {}", e),
            }
        })?;

        if config.embedding_dim > model.hidden_size() {
            return Err(EmbeddingError::InvalidConfig {
                reason: format!(
                    "embedding_dim ({}) exceeds model hidden_size ({})",
                    config.embedding_dim,
                    model.hidden_size()
                ),
            });
        }

        info!(
            model_dir = %config.model_dir.display(),
            embedding_dim = config.embedding_dim,
            max_seq_len = config.max_seq_len,
            hidden_size = model.hidden_size(),
            num_layers = model.num_layers(),
            "Sentence embedder loaded"
        );

        Ok(Self {
            backend: EmbedderBackend::Model {
                model: Arc::new(model),
                tokenizer: Arc::new(tokenizer),
                device,
            },
            config,
        })
    }

    /// Generates embeddings for a batch of strings in a single forward pass.
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        match &self.backend {
            EmbedderBackend::Model {
                model,
                tokenizer,
                device,
            } => self.embed_batch_with_model(texts, model, tokenizer, device),
            EmbedderBackend::Stub => Ok(texts.iter().map(|text| self.embed_stub(text)).collect()),
        }
    }

    fn embed_batch_with_model(
        &self,
        texts: &[&str],
        model: &MeanPooledBert,
        tokenizer: &tokenizers::Tokenizer,
        device: &Device,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let encodings = tokenizer.encode_batch(texts.to_vec(), true).map_err(|e| {
            EmbeddingError::TokenizationFailed {
                reason: e.to_string(),
            }
        })?;

        let batch = encodings.len();
        let seq_len = encodings.first().map_or(0, |e| e.get_ids().len());
        if seq_len == 0 || encodings.iter().any(|e| e.get_ids().len() != seq_len) {
            return Err(EmbeddingError::TokenizationFailed {
                reason: format!("batch of {} texts did not pad to a common length", batch),
            });
        }

        let mut ids = Vec::with_capacity(batch * seq_len);
        let mut mask = Vec::with_capacity(batch * seq_len);
        for encoding in &encodings {
            ids.extend_from_slice(encoding.get_ids());
            mask.extend_from_slice(encoding.get_attention_mask());
        }

        debug!(batch, seq_len, "Running encoder forward pass");

        let input_ids = Tensor::from_vec(ids, (batch, seq_len), device)?;
        let attention_mask = Tensor::from_vec(mask, (batch, seq_len), device)?;

        let pooled = model
            .forward_pooled(&input_ids, &attention_mask)
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("Encoder forward pass failed: {}", e),
            })?;

        let rows = pooled
            .narrow(1, 0, self.config.embedding_dim)?
            .to_vec2::<f32>()?;

        Ok(rows)
    }

    /// Hashed bag-of-words vector: each lowercase alphanumeric token adds 1.0 to a
    /// BLAKE3-selected bucket. Identical texts embed identically; shared words
    /// produce positive similarity.
    fn embed_stub(&self, text: &str) -> Vec<f32> {
        let dim = self.config.embedding_dim;
        let mut embedding = vec![0.0f32; dim];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = blake3::hash(token.to_lowercase().as_bytes());
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&hash.as_bytes()[..8]);
            let bucket = (u64::from_le_bytes(bytes) % dim as u64) as usize;
            embedding[bucket] += 1.0;
        }

        embedding
    }

    /// Returns the configured output embedding dimension.
    pub fn embedding_dim(&self) -> usize {
        self.config.embedding_dim
    }

    /// Returns `true` if running in stub mode.
    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EmbedderBackend::Stub)
    }

    /// Returns `true` if a model is loaded.
    pub fn has_model(&self) -> bool {
        matches!(self.backend, EmbedderBackend::Model { .. })
    }

    /// Returns the embedder configuration.
    pub fn config(&self) -> &SentenceEmbedderConfig {
        &self.config
    }
}

impl Embedder for SentenceEmbedder {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        self.embed_batch(&refs)
    }

    fn embedding_dim(&self) -> usize {
        self.config.embedding_dim
    }
}
