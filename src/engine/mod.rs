//! Relevance decision engine.
//!
//! Combines two independent textual-relevance signals (lexical keyword
//! overlap and semantic embedding similarity) under a sensitivity profile,
//! with fail-open error semantics: any internal failure yields a "relevant"
//! verdict rather than an error.
//!
//! The fixed evaluation order is: resolve thresholds, acquire capabilities
//! (concurrently), build keyword sets (two concurrent extractions), embed
//! task/title/content (three concurrent embeddings), then run the verdict
//! cascade. Keyword overlap is the strongest, cheapest-to-trust signal and is
//! checked first; the blended score is the lenient catch-all and the only
//! strict inequality.

#[allow(clippy::module_inception)]
mod engine;
mod error;
mod keywords;
pub mod similarity;
mod types;


pub use engine::RelevanceEngine;
pub use error::AnalysisError;
pub use similarity::cosine_similarity;
pub use types::{AnalysisRequest, PageData, RelevanceVerdict, SensitivityLevel, ThresholdSet};
