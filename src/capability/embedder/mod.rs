//! Sentence embedder (BERT encoder + mean pooling).
//!
//! Use [`EmbedderConfig::stub`] for tests/hosts without model files.

pub mod config;


pub use config::EmbedderConfig;

use std::path::Path;
use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::capability::device::select_device;
use crate::capability::error::EmbeddingError;
use crate::capability::tokenizer::load_tokenizer;
use crate::capability::{EmbedOptions, EmbeddingService, Pooling};
use crate::loader::{CapabilityFactory, CapabilityKind, ProgressCallback, ServiceLoadError};

#[derive(Clone)]
enum EmbedderBackend {
    Model {
        model: Arc<BertModel>,
        tokenizer: Arc<Tokenizer>,
        device: Device,
    },
    Stub,
}

/// Embedding generator for relevance scoring (supports stub mode).
#[derive(Clone)]
pub struct TextEmbedder {
    backend: EmbedderBackend,
    config: EmbedderConfig,
}

impl std::fmt::Debug for TextEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEmbedder")
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

impl TextEmbedder {
    /// Loads the embedder from a config (stub mode is supported).
    pub fn load(config: EmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!("Text embedder running in STUB mode (testing only)");
            return Ok(Self {
                backend: EmbedderBackend::Stub,
                config,
            });
        }

        let device = select_device();
        debug!(?device, "Selected compute device for embedder");

        let (model, bert_config) = load_bert_encoder(&config.model_path, &device)?;
        let tokenizer = load_tokenizer(&config.model_path, config.max_seq_len).map_err(|e| {
            EmbeddingError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            }
        })?;

        if config.embedding_dim != bert_config.hidden_size {
            return Err(EmbeddingError::InvalidConfig {
                reason: format!(
                    "embedding_dim ({}) does not match model hidden_size ({})",
                    config.embedding_dim, bert_config.hidden_size
                ),
            });
        }

        info!(
            model_path = %config.model_path.display(),
            embedding_dim = config.embedding_dim,
            max_seq_len = config.max_seq_len,
            "Embedding model loaded"
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

    /// Loads a stub embedder.
    pub fn stub() -> Result<Self, EmbeddingError> {
        Self::load(EmbedderConfig::stub())
    }

    /// Returns `true` if running in stub mode.
    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EmbedderBackend::Stub)
    }

    /// Returns the embedder configuration.
    pub fn config(&self) -> &EmbedderConfig {
        &self.config
    }

    fn embed_blocking(&self, text: &str, options: EmbedOptions) -> Result<Vec<f32>, EmbeddingError> {
        match &self.backend {
            EmbedderBackend::Model {
                model,
                tokenizer,
                device,
            } => self.embed_with_model(text, options, model, tokenizer, device),
            EmbedderBackend::Stub => self.embed_stub(text, options),
        }
    }

    fn embed_with_model(
        &self,
        text: &str,
        options: EmbedOptions,
        model: &BertModel,
        tokenizer: &Tokenizer,
        device: &Device,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        let ids = encoding.get_ids();
        if ids.is_empty() {
            return Ok(vec![0.0; self.config.embedding_dim]);
        }

        debug!(
            text_len = text.len(),
            token_count = ids.len(),
            "Generating embedding"
        );

        let input_ids = Tensor::new(ids, device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), device)?.unsqueeze(0)?;

        // [1, seq, hidden]
        let hidden = model.forward(&input_ids, &type_ids, Some(&attention_mask))?;

        let embedding = match options.pooling {
            Pooling::Mean => {
                // Attention-mask-weighted mean over the sequence axis.
                let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
                let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
                let counts = mask.sum(1)?;
                summed.broadcast_div(&counts)?.squeeze(0)?.to_vec1::<f32>()?
            }
        };

        if options.normalize {
            Ok(unit_normalize(embedding))
        } else {
            Ok(embedding)
        }
    }

    fn embed_stub(&self, text: &str, options: EmbedOptions) -> Result<Vec<f32>, EmbeddingError> {
        use std::hash::{DefaultHasher, Hash, Hasher};

        debug!(text_len = text.len(), "Generating stub embedding");

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();

        let mut embedding = Vec::with_capacity(self.config.embedding_dim);
        let mut state = seed;

        for _ in 0..self.config.embedding_dim {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            embedding.push(value);
        }

        if options.normalize {
            Ok(unit_normalize(embedding))
        } else {
            Ok(embedding)
        }
    }
}

fn unit_normalize(mut embedding: Vec<f32>) -> Vec<f32> {
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm > 0.0 {
        for x in &mut embedding {
            *x /= norm;
        }
    }

    embedding
}

fn load_bert_encoder(
    model_dir: &Path,
    device: &Device,
) -> Result<(BertModel, BertConfig), EmbeddingError> {
    let config_path = model_dir.join("config.json");
    let weights_path = model_dir.join("model.safetensors");

    let config_content = std::fs::read_to_string(&config_path)?;
    let bert_config: BertConfig =
        serde_json::from_str(&config_content).map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("Failed to parse config.json: {}", e),
        })?;

    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to map safetensors: {}", e),
            }
        })?
    };

    // Sentence-transformer exports are unprefixed; plain HF exports nest
    // everything under "bert".
    let model = if vb.contains_tensor("embeddings.word_embeddings.weight") {
        BertModel::load(vb, &bert_config)
    } else {
        BertModel::load(vb.pp("bert"), &bert_config)
    }
    .map_err(|e| EmbeddingError::ModelLoadFailed {
        reason: format!("Failed to load BERT encoder: {}", e),
    })?;

    Ok((model, bert_config))
}

impl EmbeddingService for TextEmbedder {
    async fn embed(&self, text: &str, options: EmbedOptions) -> Result<Vec<f32>, EmbeddingError> {
        match &self.backend {
            // Stub path is cheap; no reason to leave the async context.
            EmbedderBackend::Stub => self.embed_stub(text, options),
            EmbedderBackend::Model { .. } => {
                let embedder = self.clone();
                let text = text.to_string();

                tokio::task::spawn_blocking(move || embedder.embed_blocking(&text, options))
                    .await
                    .map_err(|e| EmbeddingError::InferenceFailed {
                        reason: format!("embedding task panicked: {}", e),
                    })?
            }
        }
    }

    fn embedding_dim(&self) -> usize {
        self.config.embedding_dim
    }
}

/// Factory for lazily instantiating a [`TextEmbedder`] through the loader.
#[derive(Debug, Clone)]
pub struct TextEmbedderFactory {
    config: EmbedderConfig,
}

impl TextEmbedderFactory {
    pub fn new(config: EmbedderConfig) -> Self {
        Self { config }
    }
}

impl CapabilityFactory for TextEmbedderFactory {
    type Instance = TextEmbedder;

    const KIND: CapabilityKind = CapabilityKind::Embedding;

    async fn create(
        &self,
        progress: Option<ProgressCallback>,
    ) -> Result<TextEmbedder, ServiceLoadError> {
        crate::loader::report_progress(&progress, Self::KIND, 0.0);

        let config = self.config.clone();
        let embedder = tokio::task::spawn_blocking(move || TextEmbedder::load(config))
            .await
            .map_err(|e| ServiceLoadError::InstantiationFailed {
                kind: Self::KIND,
                reason: format!("load task panicked: {}", e),
            })?
            .map_err(|e| ServiceLoadError::InstantiationFailed {
                kind: Self::KIND,
                reason: e.to_string(),
            })?;

        crate::loader::report_progress(&progress, Self::KIND, 1.0);
        Ok(embedder)
    }
}
