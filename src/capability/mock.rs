//! Mock capabilities (in-memory canned responses + failure injection).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use super::error::{EmbeddingError, ExtractionError};
use super::{EmbedOptions, EmbeddingService, EntityClass, KeywordExtractor, TaggedToken};
use crate::loader::{CapabilityFactory, CapabilityKind, ProgressCallback, ServiceLoadError};

/// Builds a span-start entity token, the shape the engine keeps for task
/// keywords.
pub fn entity_token(word: &str, class: EntityClass) -> TaggedToken {
    TaggedToken::new(word, class, true)
}

/// Builds a continuation token of an entity span.
pub fn continuation_token(word: &str, class: EntityClass) -> TaggedToken {
    TaggedToken::new(word, class, false)
}

/// Builds a non-entity token.
pub fn plain_token(word: &str) -> TaggedToken {
    TaggedToken::new(word, EntityClass::Other, false)
}

#[derive(Debug, Default, Clone)]
pub struct MockKeywordExtractor {
    responses: Arc<std::sync::RwLock<HashMap<String, Vec<TaggedToken>>>>,
    fail: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl MockKeywordExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the token sequence returned for an exact input text.
    /// Unregistered inputs yield an empty token list.
    pub fn set_response(&self, text: &str, tokens: Vec<TaggedToken>) {
        self.responses
            .write()
            .expect("lock poisoned")
            .insert(text.to_string(), tokens);
    }

    /// Makes every subsequent `extract` call fail.
    pub fn fail_extractions(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl KeywordExtractor for MockKeywordExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<TaggedToken>, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(ExtractionError::InferenceFailed {
                reason: "mock extraction failure".to_string(),
            });
        }

        Ok(self
            .responses
            .read()
            .expect("lock poisoned")
            .get(text)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Clone)]
pub struct MockEmbeddingService {
    responses: Arc<std::sync::RwLock<HashMap<String, Vec<f32>>>>,
    dim: usize,
    fail: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockEmbeddingService {
    fn default() -> Self {
        Self::with_dim(8)
    }
}

impl MockEmbeddingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dim(dim: usize) -> Self {
        Self {
            responses: Arc::default(),
            dim,
            fail: Arc::default(),
            calls: Arc::default(),
        }
    }

    /// Registers the vector returned for an exact input text. Unregistered
    /// inputs fall back to a deterministic hash-seeded vector of the mock's
    /// dimension.
    pub fn set_response(&self, text: &str, vector: Vec<f32>) {
        self.responses
            .write()
            .expect("lock poisoned")
            .insert(text.to_string(), vector);
    }

    /// Makes every subsequent `embed` call fail.
    pub fn fail_embeddings(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hash_vector(&self, text: &str, normalize: bool) -> Vec<f32> {
        use std::hash::{DefaultHasher, Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut state = hasher.finish();

        let mut vector = Vec::with_capacity(self.dim);
        for _ in 0..self.dim {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            vector.push(((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0);
        }

        if normalize {
            let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for x in &mut vector {
                    *x /= norm;
                }
            }
        }

        vector
    }
}

impl EmbeddingService for MockEmbeddingService {
    async fn embed(&self, text: &str, options: EmbedOptions) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(EmbeddingError::InferenceFailed {
                reason: "mock embedding failure".to_string(),
            });
        }

        let canned = self
            .responses
            .read()
            .expect("lock poisoned")
            .get(text)
            .cloned();

        Ok(canned.unwrap_or_else(|| self.hash_vector(text, options.normalize)))
    }

    fn embedding_dim(&self) -> usize {
        self.dim
    }
}

/// Factory for [`MockKeywordExtractor`] with instantiation bookkeeping, used
/// to exercise single-flight behavior in the loader.
#[derive(Default, Clone)]
pub struct MockExtractorFactory {
    extractor: MockKeywordExtractor,
    fail: Arc<AtomicBool>,
    delay: Option<Duration>,
    created: Arc<AtomicUsize>,
}

impl MockExtractorFactory {
    pub fn new(extractor: MockKeywordExtractor) -> Self {
        Self {
            extractor,
            ..Default::default()
        }
    }

    /// Delays every `create` call, widening the in-flight window.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Makes `create` fail until [`Self::succeed_creations`] is called.
    pub fn fail_creations(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn succeed_creations(&self) {
        self.fail.store(false, Ordering::SeqCst);
    }

    /// Number of completed instantiations.
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl CapabilityFactory for MockExtractorFactory {
    type Instance = MockKeywordExtractor;

    const KIND: CapabilityKind = CapabilityKind::KeywordExtraction;

    async fn create(
        &self,
        progress: Option<ProgressCallback>,
    ) -> Result<MockKeywordExtractor, ServiceLoadError> {
        crate::loader::report_progress(&progress, Self::KIND, 0.0);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceLoadError::InstantiationFailed {
                kind: Self::KIND,
                reason: "mock extractor instantiation failure".to_string(),
            });
        }

        self.created.fetch_add(1, Ordering::SeqCst);
        crate::loader::report_progress(&progress, Self::KIND, 1.0);
        Ok(self.extractor.clone())
    }
}

/// Factory for [`MockEmbeddingService`], mirroring [`MockExtractorFactory`].
#[derive(Default, Clone)]
pub struct MockEmbedderFactory {
    embedder: MockEmbeddingService,
    fail: Arc<AtomicBool>,
    delay: Option<Duration>,
    created: Arc<AtomicUsize>,
}

impl MockEmbedderFactory {
    pub fn new(embedder: MockEmbeddingService) -> Self {
        Self {
            embedder,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_creations(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn succeed_creations(&self) {
        self.fail.store(false, Ordering::SeqCst);
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl CapabilityFactory for MockEmbedderFactory {
    type Instance = MockEmbeddingService;

    const KIND: CapabilityKind = CapabilityKind::Embedding;

    async fn create(
        &self,
        progress: Option<ProgressCallback>,
    ) -> Result<MockEmbeddingService, ServiceLoadError> {
        crate::loader::report_progress(&progress, Self::KIND, 0.0);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceLoadError::InstantiationFailed {
                kind: Self::KIND,
                reason: "mock embedder instantiation failure".to_string(),
            });
        }

        self.created.fetch_add(1, Ordering::SeqCst);
        crate::loader::report_progress(&progress, Self::KIND, 1.0);
        Ok(self.embedder.clone())
    }
}
