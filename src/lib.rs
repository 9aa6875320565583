//! Focusgate library crate.
//!
//! Decides whether a piece of viewed content is relevant to a user-declared
//! focus task. Two independent signals, lexical keyword overlap and semantic
//! embedding similarity, are combined under a sensitivity profile; any
//! internal failure resolves fail-open (verdict "relevant").
//!
//! # Public API Surface
//!
//! ## Engine
//! - [`RelevanceEngine`] - the decision engine ([`RelevanceEngine::evaluate`]
//!   is infallible; errors fail open)
//! - [`AnalysisRequest`], [`PageData`], [`RelevanceVerdict`] - wire shapes
//! - [`SensitivityLevel`], [`ThresholdSet`] - strictness profiles
//! - [`cosine_similarity`] - vector math used for the similarity signal
//!
//! ## Capabilities
//! - [`KeywordExtractor`], [`EmbeddingService`] - the traits the engine
//!   consumes
//! - [`NerExtractor`], [`TextEmbedder`] - candle-backed defaults, each with a
//!   deterministic stub mode requiring no model files
//! - [`TaggedToken`], [`EntityClass`], [`EmbedOptions`] - capability data
//!   model
//!
//! ## Loader
//! - [`ServiceLoader`] - lazy, single-flight, process-lifetime instance cache
//! - [`CapabilityFactory`], [`CapabilityKind`], [`ProgressCallback`]
//!
//! ## Test/Mock Support
//! Mock capabilities and factories are available behind
//! `#[cfg(any(test, feature = "mock"))]`.

pub mod capability;
pub mod config;
pub mod constants;
pub mod engine;
pub mod loader;

pub use capability::{
    EmbedOptions, EmbedderConfig, EmbeddingError, EmbeddingService, EntityClass, ExtractionError,
    KeywordExtractor, NerConfig, NerExtractor, NerExtractorFactory, Pooling, TaggedToken,
    TextEmbedder, TextEmbedderFactory,
};
#[cfg(any(test, feature = "mock"))]
pub use capability::{
    MockEmbedderFactory, MockEmbeddingService, MockExtractorFactory, MockKeywordExtractor,
};

pub use config::{Config, ConfigError};
pub use engine::{
    AnalysisError, AnalysisRequest, PageData, RelevanceEngine, RelevanceVerdict, SensitivityLevel,
    ThresholdSet, cosine_similarity,
};
pub use loader::{
    CapabilityFactory, CapabilityKind, LoadProgress, ProgressCallback, ServiceLoadError,
    ServiceLoader,
};
