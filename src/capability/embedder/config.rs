use std::path::PathBuf;

use crate::capability::error::EmbeddingError;
use crate::constants::{DEFAULT_EMBEDDING_DIM, DEFAULT_MAX_SEQ_LEN};

#[derive(Debug, Clone)]
/// Configuration for [`TextEmbedder`](super::TextEmbedder).
pub struct EmbedderConfig {
    /// Model directory containing `config.json`, `model.safetensors` and
    /// `tokenizer.json`.
    pub model_path: PathBuf,
    /// Max tokens per forward pass (longer inputs are truncated).
    pub max_seq_len: usize,
    /// Output embedding dimension; must match the model's hidden size.
    pub embedding_dim: usize,
    /// If true, run in deterministic stub mode (no model files required).
    pub testing_stub: bool,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            testing_stub: false,
        }
    }
}

impl EmbedderConfig {
    /// Creates a config for a model directory.
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: model_path.into(),
            ..Default::default()
        }
    }

    /// Creates a stub config (no model files; deterministic embeddings).
    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    /// Validates required fields for non-stub mode.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.embedding_dim == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedding_dim must be non-zero".to_string(),
            });
        }

        if self.testing_stub {
            return Ok(());
        }

        if self.model_path.as_os_str().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model_path is required (stubbing is disabled)".to_string(),
            });
        }

        if !self.model_path.is_dir() {
            return Err(EmbeddingError::ModelNotFound {
                path: self.model_path.clone(),
            });
        }

        Ok(())
    }
}
