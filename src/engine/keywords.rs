//! Keyword set construction and overlap scoring.

use std::collections::HashSet;

use crate::capability::TaggedToken;
use crate::constants::FALLBACK_MIN_TOKEN_CHARS;

/// Builds the task keyword set: lowercase surface forms of tokens that begin
/// a named-entity span.
///
/// When tagging finds no entities, falls back to whitespace tokenization of
/// the lowercased task, keeping tokens longer than
/// [`FALLBACK_MIN_TOKEN_CHARS`] characters with no entity filtering. The
/// fallback's length filter intentionally does not apply to the entity path.
pub(super) fn task_keywords(tokens: &[TaggedToken], task: &str) -> HashSet<String> {
    let keywords: HashSet<String> = tokens
        .iter()
        .filter(|t| t.is_span_start && t.entity_class.is_named_entity())
        .map(|t| t.token.to_lowercase())
        .collect();

    if !keywords.is_empty() {
        return keywords;
    }

    task.to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > FALLBACK_MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Builds the page keyword set: every tagged token, lowercased. Unlike the
/// task side there is no entity-class or length filtering.
pub(super) fn page_keywords(tokens: &[TaggedToken]) -> HashSet<String> {
    tokens.iter().map(|t| t.token.to_lowercase()).collect()
}

/// Fraction of task keywords found among the page keywords; `0.0` when the
/// task set is empty.
pub(super) fn keyword_overlap_score(
    task_keywords: &HashSet<String>,
    page_keywords: &HashSet<String>,
) -> f32 {
    if task_keywords.is_empty() {
        return 0.0;
    }

    let matches = task_keywords.intersection(page_keywords).count();
    matches as f32 / task_keywords.len() as f32
}

/// Returns the prefix of `text` holding at most `max_chars` characters,
/// respecting `char` boundaries.
pub(super) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
