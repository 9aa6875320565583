//! Focusgate CLI entrypoint.
//!
//! Reads one `AnalysisRequest` JSON document on stdin and writes the verdict
//! JSON on stdout. Model directories come from `FOCUSGATE_*` environment
//! variables; without them both capabilities run in stub mode.

use std::io::Read;
use std::sync::Arc;

use focusgate::config::Config;
use focusgate::engine::RelevanceEngine;
use focusgate::loader::ServiceLoader;
use focusgate::{AnalysisRequest, NerExtractorFactory, TextEmbedderFactory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    if config.ner_model_path.is_none() {
        tracing::warn!("No FOCUSGATE_NER_MODEL_PATH configured, running extractor in stub mode");
    }
    if config.embed_model_path.is_none() {
        tracing::warn!("No FOCUSGATE_EMBED_MODEL_PATH configured, running embedder in stub mode");
    }

    let loader = Arc::new(ServiceLoader::new(
        NerExtractorFactory::new(config.ner_config()),
        TextEmbedderFactory::new(config.embedder_config()),
    ));
    let engine = RelevanceEngine::new(loader);

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let request: AnalysisRequest = serde_json::from_str(&input)?;

    let verdict = engine.evaluate_request(&request).await;

    println!("{}", serde_json::to_string(&verdict)?);
    Ok(())
}
