use std::sync::Arc;

use futures_util::future;
use tracing::{debug, info, warn};

use crate::capability::{EmbedOptions, EmbeddingService, KeywordExtractor};
use crate::constants::{
    COMBINED_KEYWORD_WEIGHT, COMBINED_SIMILARITY_WEIGHT, CONTENT_SIMILARITY_WEIGHT,
    KEYWORD_SCAN_CHARS, TITLE_SIMILARITY_WEIGHT,
};
use crate::loader::{CapabilityFactory, ServiceLoader};

use super::error::AnalysisError;
use super::keywords::{keyword_overlap_score, page_keywords, task_keywords, truncate_chars};
use super::similarity::cosine_similarity;
use super::types::{AnalysisRequest, PageData, RelevanceVerdict, SensitivityLevel, ThresholdSet};

/// Which cascade rule settled the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Decision {
    KeywordOverlap,
    SemanticSimilarity,
    CombinedBlend,
    NotRelevant,
}

impl Decision {
    pub(super) fn is_relevant(&self) -> bool {
        !matches!(self, Decision::NotRelevant)
    }

    fn rule(&self) -> &'static str {
        match self {
            Decision::KeywordOverlap => "keyword-overlap",
            Decision::SemanticSimilarity => "semantic-similarity",
            Decision::CombinedBlend => "combined-blend",
            Decision::NotRelevant => "none",
        }
    }
}

/// Applies the verdict cascade, first matching rule wins.
///
/// Keyword and similarity boundaries are inclusive; the blended catch-all is
/// the only strict inequality.
pub(super) fn decide(
    keyword_score: f32,
    similarity_score: f32,
    thresholds: &ThresholdSet,
) -> Decision {
    if keyword_score >= thresholds.keyword {
        return Decision::KeywordOverlap;
    }

    if similarity_score >= thresholds.similarity {
        return Decision::SemanticSimilarity;
    }

    let combined_score =
        COMBINED_SIMILARITY_WEIGHT * similarity_score + COMBINED_KEYWORD_WEIGHT * keyword_score;
    if combined_score > thresholds.combined {
        return Decision::CombinedBlend;
    }

    Decision::NotRelevant
}

/// Relevance decision engine.
///
/// `evaluate` is infallible from the caller's perspective: every internal
/// error (capability load, extraction, embedding, malformed input) is
/// converted to the fail-open verdict. Missing a real distraction is cheap;
/// blocking the user because of a transient failure erodes trust.
pub struct RelevanceEngine<KF, EF>
where
    KF: CapabilityFactory,
    EF: CapabilityFactory,
    KF::Instance: KeywordExtractor,
    EF::Instance: EmbeddingService,
{
    loader: Arc<ServiceLoader<KF, EF>>,
}

impl<KF, EF> RelevanceEngine<KF, EF>
where
    KF: CapabilityFactory,
    EF: CapabilityFactory,
    KF::Instance: KeywordExtractor,
    EF::Instance: EmbeddingService,
{
    pub fn new(loader: Arc<ServiceLoader<KF, EF>>) -> Self {
        Self { loader }
    }

    /// Returns the loader shared by this engine.
    pub fn loader(&self) -> &Arc<ServiceLoader<KF, EF>> {
        &self.loader
    }

    /// Decides whether `page` is relevant to `task` under `sensitivity`.
    pub async fn evaluate(
        &self,
        task: &str,
        page: &PageData,
        sensitivity: SensitivityLevel,
    ) -> RelevanceVerdict {
        match self.evaluate_inner(task, page, sensitivity).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(error = %e, "Relevance evaluation failed, failing open");
                RelevanceVerdict::RELEVANT
            }
        }
    }

    /// Convenience wrapper over the serde request shape.
    pub async fn evaluate_request(&self, request: &AnalysisRequest) -> RelevanceVerdict {
        self.evaluate(&request.task, &request.page_data, request.sensitivity)
            .await
    }

    async fn evaluate_inner(
        &self,
        task: &str,
        page: &PageData,
        sensitivity: SensitivityLevel,
    ) -> Result<RelevanceVerdict, AnalysisError> {
        let task = task.trim();
        if task.is_empty() {
            return Err(AnalysisError::InvalidInput {
                reason: "task is empty".to_string(),
            });
        }

        let thresholds = sensitivity.thresholds();

        debug!(
            sensitivity = %sensitivity,
            task_len = task.len(),
            title_len = page.title.len(),
            text_len = page.main_text.len(),
            "Starting relevance evaluation"
        );

        let (extractor, embedder) = future::try_join(
            self.loader.keyword_extractor(None),
            self.loader.embedding_service(None),
        )
        .await?;

        // The page side only scans a bounded prefix; tagging cost grows with
        // input length, the keyword signal does not.
        let page_slice = truncate_chars(&page.main_text, KEYWORD_SCAN_CHARS);
        let (task_tokens, page_tokens) =
            future::try_join(extractor.extract(task), extractor.extract(page_slice)).await?;

        let task_set = task_keywords(&task_tokens, task);
        let page_set = page_keywords(&page_tokens);
        let keyword_score = keyword_overlap_score(&task_set, &page_set);

        debug!(
            task_keywords = task_set.len(),
            page_keywords = page_set.len(),
            keyword_score = keyword_score,
            "Keyword overlap computed"
        );

        let options = EmbedOptions::default();
        let (task_embedding, title_embedding, content_embedding) = future::try_join3(
            embedder.embed(task, options),
            embedder.embed(&page.title, options),
            embedder.embed(&page.main_text, options),
        )
        .await?;

        check_dimensions(&task_embedding, &title_embedding)?;
        check_dimensions(&task_embedding, &content_embedding)?;

        let title_similarity = cosine_similarity(&task_embedding, &title_embedding);
        let content_similarity = cosine_similarity(&task_embedding, &content_embedding);
        let similarity_score = TITLE_SIMILARITY_WEIGHT * title_similarity
            + CONTENT_SIMILARITY_WEIGHT * content_similarity;

        debug!(
            title_similarity = title_similarity,
            content_similarity = content_similarity,
            similarity_score = similarity_score,
            "Semantic similarity computed"
        );

        let decision = decide(keyword_score, similarity_score, &thresholds);

        info!(
            sensitivity = %sensitivity,
            keyword_score = keyword_score,
            similarity_score = similarity_score,
            rule = decision.rule(),
            is_relevant = decision.is_relevant(),
            "Relevance verdict"
        );

        Ok(RelevanceVerdict {
            is_relevant: decision.is_relevant(),
        })
    }
}

fn check_dimensions(expected: &[f32], actual: &[f32]) -> Result<(), AnalysisError> {
    if expected.len() != actual.len() {
        return Err(AnalysisError::Embedding(
            crate::capability::EmbeddingError::DimensionMismatch {
                expected: expected.len(),
                actual: actual.len(),
            },
        ));
    }
    Ok(())
}
