//! Environment-backed configuration.
//!
//! Everything has a default. Override with `FOCUSGATE_*` environment
//! variables. The score thresholds and blend weights are fixed design
//! parameters and deliberately have no configuration hooks.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;

use crate::capability::{EmbedderConfig, NerConfig};
use crate::constants::{DEFAULT_EMBEDDING_DIM, DEFAULT_MAX_SEQ_LEN};

/// Host configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `FOCUSGATE_*` overrides on top of
/// defaults. Absent model paths put the corresponding capability into stub
/// mode.
#[derive(Debug, Clone)]
pub struct Config {
    /// NER model directory. `None` → stub extractor.
    pub ner_model_path: Option<PathBuf>,

    /// Embedding model directory. `None` → stub embedder.
    pub embed_model_path: Option<PathBuf>,

    /// Embedding output dimension. Default: `384`.
    pub embedding_dim: usize,

    /// Max tokens per transformer forward pass. Default: `512`.
    pub max_seq_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ner_model_path: None,
            embed_model_path: None,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
        }
    }
}

impl Config {
    const ENV_NER_MODEL_PATH: &'static str = "FOCUSGATE_NER_MODEL_PATH";
    const ENV_EMBED_MODEL_PATH: &'static str = "FOCUSGATE_EMBED_MODEL_PATH";
    const ENV_EMBEDDING_DIM: &'static str = "FOCUSGATE_EMBEDDING_DIM";
    const ENV_MAX_SEQ_LEN: &'static str = "FOCUSGATE_MAX_SEQ_LEN";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            ner_model_path: Self::parse_optional_path_from_env(Self::ENV_NER_MODEL_PATH),
            embed_model_path: Self::parse_optional_path_from_env(Self::ENV_EMBED_MODEL_PATH),
            embedding_dim: Self::parse_nonzero_usize_from_env(
                Self::ENV_EMBEDDING_DIM,
                defaults.embedding_dim,
            )?,
            max_seq_len: Self::parse_nonzero_usize_from_env(
                Self::ENV_MAX_SEQ_LEN,
                defaults.max_seq_len,
            )?,
        })
    }

    /// Validates paths (does not create anything).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in [&self.ner_model_path, &self.embed_model_path]
            .into_iter()
            .flatten()
        {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        Ok(())
    }

    /// Builds the extractor capability config (stub when no path is set).
    pub fn ner_config(&self) -> NerConfig {
        match &self.ner_model_path {
            Some(path) => NerConfig {
                model_path: path.clone(),
                max_seq_len: self.max_seq_len,
                testing_stub: false,
            },
            None => NerConfig::stub(),
        }
    }

    /// Builds the embedder capability config (stub when no path is set).
    pub fn embedder_config(&self) -> EmbedderConfig {
        match &self.embed_model_path {
            Some(path) => EmbedderConfig {
                model_path: path.clone(),
                max_seq_len: self.max_seq_len,
                embedding_dim: self.embedding_dim,
                testing_stub: false,
            },
            None => EmbedderConfig {
                embedding_dim: self.embedding_dim,
                ..EmbedderConfig::stub()
            },
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_nonzero_usize_from_env(
        var_name: &'static str,
        default: usize,
    ) -> Result<usize, ConfigError> {
        match env::var(var_name) {
            Ok(value) => {
                let parsed: usize =
                    value
                        .trim()
                        .parse()
                        .map_err(|e| ConfigError::InvalidNumber {
                            name: var_name,
                            value: value.clone(),
                            source: e,
                        })?;

                if parsed == 0 {
                    return Err(ConfigError::OutOfRange {
                        name: var_name,
                        reason: "must be non-zero".to_string(),
                    });
                }

                Ok(parsed)
            }
            Err(_) => Ok(default),
        }
    }
}
