//! Lazy singleton loader for the extraction and embedding capabilities.
//!
//! Capability instantiation is expensive (model files are mapped and parsed,
//! taking on the order of seconds), so instances are created at most once per
//! kind and shared for the remainder of the process lifetime. Concurrent
//! first requests are collapsed into one instantiation (single-flight); every
//! caller, including the triggering one, awaits the same pending result.
//! There is no API to force re-creation.

mod error;
mod slot;

#[cfg(test)]
mod tests;

pub use error::ServiceLoadError;

use std::sync::Arc;

use futures_util::FutureExt;
use tracing::info;

use slot::SingleFlightSlot;

/// The two capability kinds the loader manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    KeywordExtraction,
    Embedding,
}

impl std::fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapabilityKind::KeywordExtraction => write!(f, "keyword-extraction"),
            CapabilityKind::Embedding => write!(f, "embedding"),
        }
    }
}

/// Progress report emitted during capability instantiation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadProgress {
    pub capability: CapabilityKind,
    /// Completed fraction in [0, 1].
    pub fraction: f32,
}

/// Callback invoked with instantiation progress.
pub type ProgressCallback = Arc<dyn Fn(LoadProgress) + Send + Sync>;

/// Invokes `progress` if present. Factories call this at their milestones.
pub fn report_progress(
    progress: &Option<ProgressCallback>,
    capability: CapabilityKind,
    fraction: f32,
) {
    if let Some(callback) = progress {
        callback(LoadProgress {
            capability,
            fraction,
        });
    }
}

/// Asynchronously instantiates one capability.
///
/// Implementations should be cheap to construct; all expensive work belongs
/// in [`create`](CapabilityFactory::create), which the loader invokes at most
/// once per successful instantiation.
pub trait CapabilityFactory: Send + Sync + 'static {
    type Instance: Send + Sync + 'static;

    const KIND: CapabilityKind;

    fn create(
        &self,
        progress: Option<ProgressCallback>,
    ) -> impl std::future::Future<Output = Result<Self::Instance, ServiceLoadError>> + Send;
}

/// Process-wide loader holding one instance slot per capability kind.
pub struct ServiceLoader<KF: CapabilityFactory, EF: CapabilityFactory> {
    keyword_factory: Arc<KF>,
    embedding_factory: Arc<EF>,
    keyword_slot: SingleFlightSlot<KF::Instance>,
    embedding_slot: SingleFlightSlot<EF::Instance>,
}

impl<KF: CapabilityFactory, EF: CapabilityFactory> ServiceLoader<KF, EF> {
    pub fn new(keyword_factory: KF, embedding_factory: EF) -> Self {
        Self {
            keyword_factory: Arc::new(keyword_factory),
            embedding_factory: Arc::new(embedding_factory),
            keyword_slot: SingleFlightSlot::default(),
            embedding_slot: SingleFlightSlot::default(),
        }
    }

    /// Returns the keyword-extraction instance, instantiating it on first use.
    pub async fn keyword_extractor(
        &self,
        progress: Option<ProgressCallback>,
    ) -> Result<Arc<KF::Instance>, ServiceLoadError> {
        let factory = self.keyword_factory.clone();
        self.keyword_slot
            .get_or_init(move || {
                info!(capability = %KF::KIND, "Instantiating capability");
                async move { factory.create(progress).await }.boxed()
            })
            .await
    }

    /// Returns the embedding instance, instantiating it on first use.
    pub async fn embedding_service(
        &self,
        progress: Option<ProgressCallback>,
    ) -> Result<Arc<EF::Instance>, ServiceLoadError> {
        let factory = self.embedding_factory.clone();
        self.embedding_slot
            .get_or_init(move || {
                info!(capability = %EF::KIND, "Instantiating capability");
                async move { factory.create(progress).await }.boxed()
            })
            .await
    }

    /// Returns the cached keyword-extraction instance, if already created.
    pub fn cached_keyword_extractor(&self) -> Option<Arc<KF::Instance>> {
        self.keyword_slot.get()
    }

    /// Returns the cached embedding instance, if already created.
    pub fn cached_embedding_service(&self) -> Option<Arc<EF::Instance>> {
        self.embedding_slot.get()
    }
}

impl<KF: CapabilityFactory, EF: CapabilityFactory> std::fmt::Debug for ServiceLoader<KF, EF> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceLoader")
            .field("keyword_cached", &self.cached_keyword_extractor().is_some())
            .field("embedding_cached", &self.cached_embedding_service().is_some())
            .finish()
    }
}
