use thiserror::Error;

use crate::capability::{EmbeddingError, ExtractionError};
use crate::loader::ServiceLoadError;

/// Any failure inside one relevance evaluation.
///
/// Never reaches the caller: `evaluate` maps every variant to the fail-open
/// verdict at the engine boundary.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("service load failed: {0}")]
    ServiceLoad(#[from] ServiceLoadError),

    #[error("keyword extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
}
