use std::path::PathBuf;

use crate::capability::error::ExtractionError;
use crate::constants::DEFAULT_MAX_SEQ_LEN;

#[derive(Debug, Clone)]
/// Configuration for [`NerExtractor`](super::NerExtractor).
pub struct NerConfig {
    /// Model directory containing `config.json`, `model.safetensors` and
    /// `tokenizer.json`. The `config.json` must carry an `id2label` table
    /// with BIO-style labels (`O`, `B-PER`, `I-ORG`, ...).
    pub model_path: PathBuf,
    /// Max tokens per forward pass (longer inputs are truncated).
    pub max_seq_len: usize,
    /// If true, run a heuristic stub tagger (no model files required).
    pub testing_stub: bool,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            testing_stub: false,
        }
    }
}

impl NerConfig {
    /// Creates a config for a model directory.
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: model_path.into(),
            ..Default::default()
        }
    }

    /// Creates a stub config (no model files; heuristic tagging).
    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    /// Validates required fields for non-stub mode.
    pub fn validate(&self) -> Result<(), ExtractionError> {
        if self.testing_stub {
            return Ok(());
        }

        if self.model_path.as_os_str().is_empty() {
            return Err(ExtractionError::InvalidConfig {
                reason: "model_path is required (stubbing is disabled)".to_string(),
            });
        }

        if !self.model_path.is_dir() {
            return Err(ExtractionError::ModelNotFound {
                path: self.model_path.clone(),
            });
        }

        Ok(())
    }
}
