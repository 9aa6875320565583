//! Cross-cutting, shared constants.
//!
//! Scoring weights and text caps are fixed design parameters, not tunables;
//! keep them here rather than threading them through configuration.

/// Upstream cap on `main_text` length (characters). Enforced by the caller,
/// not re-checked by the engine.
pub const MAIN_TEXT_MAX_CHARS: usize = 5000;

/// Keyword extraction only scans this many leading characters of the page
/// text, bounding worst-case tagging cost.
pub const KEYWORD_SCAN_CHARS: usize = 3000;

/// Fallback task tokenization keeps only tokens strictly longer than this.
pub const FALLBACK_MIN_TOKEN_CHARS: usize = 3;

/// Title vs. content weighting for the similarity signal. The title is the
/// denser, less noisy signal, so it carries more weight.
pub const TITLE_SIMILARITY_WEIGHT: f32 = 0.6;
pub const CONTENT_SIMILARITY_WEIGHT: f32 = 0.4;

/// Blend weights for the combined catch-all score.
pub const COMBINED_SIMILARITY_WEIGHT: f32 = 0.7;
pub const COMBINED_KEYWORD_WEIGHT: f32 = 0.3;

/// Default output dimension of the sentence embedder (MiniLM-class models).
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Default max tokens fed to either transformer in one forward pass.
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;
