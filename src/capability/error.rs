use std::path::PathBuf;
use thiserror::Error;

/// Errors from the keyword/entity extraction capability.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extractor model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load extractor model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("extractor inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("invalid extractor configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl From<candle_core::Error> for ExtractionError {
    fn from(err: candle_core::Error) -> Self {
        ExtractionError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ExtractionError {
    fn from(err: std::io::Error) -> Self {
        ExtractionError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}

/// Errors from the embedding capability.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load embedding model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("embedding inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid embedder configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl From<candle_core::Error> for EmbeddingError {
    fn from(err: candle_core::Error) -> Self {
        EmbeddingError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for EmbeddingError {
    fn from(err: std::io::Error) -> Self {
        EmbeddingError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}
