use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::*;
use crate::capability::mock::{
    MockEmbedderFactory, MockEmbeddingService, MockExtractorFactory, MockKeywordExtractor,
};

fn mock_loader(
    delay: Option<Duration>,
) -> ServiceLoader<MockExtractorFactory, MockEmbedderFactory> {
    let mut extractor_factory = MockExtractorFactory::new(MockKeywordExtractor::new());
    let mut embedder_factory = MockEmbedderFactory::new(MockEmbeddingService::new());

    if let Some(delay) = delay {
        extractor_factory = extractor_factory.with_delay(delay);
        embedder_factory = embedder_factory.with_delay(delay);
    }

    ServiceLoader::new(extractor_factory, embedder_factory)
}

#[tokio::test]
async fn test_concurrent_first_calls_instantiate_once() {
    let loader = Arc::new(mock_loader(Some(Duration::from_millis(50))));

    let a = {
        let loader = loader.clone();
        tokio::spawn(async move { loader.keyword_extractor(None).await })
    };
    let b = {
        let loader = loader.clone();
        tokio::spawn(async move { loader.keyword_extractor(None).await })
    };

    let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());

    assert!(Arc::ptr_eq(&a, &b));

    // A third call after completion still sees the cached instance.
    let c = loader.keyword_extractor(None).await.unwrap();
    assert!(Arc::ptr_eq(&a, &c));
}

#[tokio::test]
async fn test_instance_cached_after_first_call() {
    let extractor_factory = MockExtractorFactory::new(MockKeywordExtractor::new());
    let loader = ServiceLoader::new(
        extractor_factory.clone(),
        MockEmbedderFactory::new(MockEmbeddingService::new()),
    );

    loader.keyword_extractor(None).await.unwrap();
    loader.keyword_extractor(None).await.unwrap();
    loader.keyword_extractor(None).await.unwrap();

    assert_eq!(extractor_factory.created_count(), 1);
}

#[tokio::test]
async fn test_capability_kinds_have_independent_slots() {
    let loader = mock_loader(None);

    assert!(loader.cached_keyword_extractor().is_none());
    assert!(loader.cached_embedding_service().is_none());

    loader.keyword_extractor(None).await.unwrap();
    assert!(loader.cached_keyword_extractor().is_some());
    assert!(loader.cached_embedding_service().is_none());

    loader.embedding_service(None).await.unwrap();
    assert!(loader.cached_embedding_service().is_some());
}

#[tokio::test]
async fn test_failure_fans_out_to_all_waiters() {
    let extractor_factory = MockExtractorFactory::new(MockKeywordExtractor::new())
        .with_delay(Duration::from_millis(50));
    extractor_factory.fail_creations();

    let loader = Arc::new(ServiceLoader::new(
        extractor_factory.clone(),
        MockEmbedderFactory::new(MockEmbeddingService::new()),
    ));

    let a = {
        let loader = loader.clone();
        tokio::spawn(async move { loader.keyword_extractor(None).await })
    };
    let b = {
        let loader = loader.clone();
        tokio::spawn(async move { loader.keyword_extractor(None).await })
    };

    let a = a.await.unwrap();
    let b = b.await.unwrap();
    assert!(a.is_err());
    assert!(b.is_err());
    assert_eq!(
        a.unwrap_err().kind(),
        CapabilityKind::KeywordExtraction
    );
    assert_eq!(extractor_factory.created_count(), 0);
}

#[tokio::test]
async fn test_failed_slot_allows_retry() {
    let extractor_factory = MockExtractorFactory::new(MockKeywordExtractor::new());
    extractor_factory.fail_creations();

    let loader = ServiceLoader::new(
        extractor_factory.clone(),
        MockEmbedderFactory::new(MockEmbeddingService::new()),
    );

    assert!(loader.keyword_extractor(None).await.is_err());
    assert!(loader.cached_keyword_extractor().is_none());

    extractor_factory.succeed_creations();
    assert!(loader.keyword_extractor(None).await.is_ok());
    assert_eq!(extractor_factory.created_count(), 1);
}

#[tokio::test]
async fn test_progress_callback_reports_milestones() {
    let loader = mock_loader(None);

    let reports: Arc<std::sync::Mutex<Vec<LoadProgress>>> = Arc::default();
    let sink = reports.clone();
    let callback: ProgressCallback = Arc::new(move |p| sink.lock().unwrap().push(p));

    loader.embedding_service(Some(callback)).await.unwrap();

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].capability, CapabilityKind::Embedding);
    assert_eq!(reports[0].fraction, 0.0);
    assert_eq!(reports[1].fraction, 1.0);
}

#[tokio::test]
async fn test_progress_not_invoked_on_cache_hit() {
    let loader = mock_loader(None);
    loader.embedding_service(None).await.unwrap();

    let count = Arc::new(AtomicUsize::new(0));
    let sink = count.clone();
    let callback: ProgressCallback = Arc::new(move |_| {
        sink.fetch_add(1, Ordering::SeqCst);
    });

    loader.embedding_service(Some(callback)).await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn test_capability_kind_display() {
    assert_eq!(
        CapabilityKind::KeywordExtraction.to_string(),
        "keyword-extraction"
    );
    assert_eq!(CapabilityKind::Embedding.to_string(), "embedding");
}

#[test]
fn test_service_load_error_kind_accessor() {
    let err = ServiceLoadError::InstantiationFailed {
        kind: CapabilityKind::Embedding,
        reason: "boom".to_string(),
    };
    assert_eq!(err.kind(), CapabilityKind::Embedding);
    assert!(err.to_string().contains("embedding"));
}
