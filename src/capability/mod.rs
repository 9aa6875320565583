//! Extraction and embedding capabilities.
//!
//! The engine only sees the [`KeywordExtractor`] and [`EmbeddingService`]
//! traits; [`ner`] and [`embedder`] provide candle-backed defaults, each with
//! a deterministic stub mode requiring no model files.

/// Compute device selection (CPU / Metal / CUDA).
pub mod device;
/// Sentence embedder (mean pooling + unit normalization).
pub mod embedder;
mod error;
/// Keyword/entity extractor (BERT token classification).
pub mod ner;
/// Tokenizer loading helpers.
pub mod tokenizer;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use embedder::{EmbedderConfig, TextEmbedder, TextEmbedderFactory};
pub use error::{EmbeddingError, ExtractionError};
pub use ner::{NerConfig, NerExtractor, NerExtractorFactory};

#[cfg(any(test, feature = "mock"))]
pub use mock::{
    MockEmbedderFactory, MockEmbeddingService, MockExtractorFactory, MockKeywordExtractor,
};

/// Closed entity class for tagged tokens. Labels outside the four classes the
/// engine cares about collapse into [`EntityClass::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityClass {
    Misc,
    Loc,
    Per,
    Org,
    Other,
}

impl EntityClass {
    /// Parses a class name as emitted by NER label sets (`"PER"`, `"LOC"`, ...).
    pub fn from_label(label: &str) -> Self {
        match label {
            "MISC" => EntityClass::Misc,
            "LOC" => EntityClass::Loc,
            "PER" => EntityClass::Per,
            "ORG" => EntityClass::Org,
            _ => EntityClass::Other,
        }
    }

    /// Returns `true` for the classes that count as task keywords.
    pub fn is_named_entity(&self) -> bool {
        !matches!(self, EntityClass::Other)
    }
}

/// One extracted token with its entity tag.
///
/// `is_span_start` marks the first token of a multi-token entity mention
/// (the `B-` side of BIO tagging, lifted into an explicit field).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub token: String,
    pub entity_class: EntityClass,
    pub is_span_start: bool,
}

impl TaggedToken {
    pub fn new(token: impl Into<String>, entity_class: EntityClass, is_span_start: bool) -> Self {
        Self {
            token: token.into(),
            entity_class,
            is_span_start,
        }
    }
}

/// Pooling strategy for sentence embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pooling {
    /// Average token embeddings, weighted by the attention mask.
    #[default]
    Mean,
}

/// Options for a single embedding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedOptions {
    pub pooling: Pooling,
    /// Scale the pooled vector to unit length.
    pub normalize: bool,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            pooling: Pooling::Mean,
            normalize: true,
        }
    }
}

/// Async interface to the keyword/entity extraction capability.
pub trait KeywordExtractor: Send + Sync {
    /// Tags `text` and returns one record per surface token.
    fn extract(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<TaggedToken>, ExtractionError>> + Send;
}

/// Async interface to the embedding capability.
pub trait EmbeddingService: Send + Sync {
    /// Embeds `text` into a fixed-length vector.
    fn embed(
        &self,
        text: &str,
        options: EmbedOptions,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, EmbeddingError>> + Send;

    /// Output vector length; identical for every call on one instance.
    fn embedding_dim(&self) -> usize;
}
