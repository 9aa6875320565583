//! Keyword/entity extractor (BERT token classification).
//!
//! Maps BIO label strings from the model's `config.json` into the closed
//! [`EntityClass`] enum plus an explicit span-start flag, so downstream code
//! never matches on `"B-"`/`"I-"` prefixes.
//!
//! Use [`NerConfig::stub`] for tests/hosts without model files.

pub mod config;


pub use config::NerConfig;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use candle_core::{D, DType, Device, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::capability::device::select_device;
use crate::capability::error::ExtractionError;
use crate::capability::tokenizer::load_tokenizer;
use crate::capability::{EntityClass, KeywordExtractor, TaggedToken};
use crate::loader::{CapabilityFactory, CapabilityKind, ProgressCallback, ServiceLoadError};

/// One entry of the model's BIO label set, pre-parsed at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BioTag {
    class: EntityClass,
    span_start: bool,
}

impl BioTag {
    const OUTSIDE: BioTag = BioTag {
        class: EntityClass::Other,
        span_start: false,
    };

    /// Parses a BIO label string (`"O"`, `"B-PER"`, `"I-ORG"`, ...).
    fn parse(label: &str) -> BioTag {
        match label.split_once('-') {
            Some(("B", class)) => BioTag {
                class: EntityClass::from_label(class),
                span_start: true,
            },
            Some(("I", class)) => BioTag {
                class: EntityClass::from_label(class),
                span_start: false,
            },
            _ => BioTag::OUTSIDE,
        }
    }
}

struct NerModel {
    bert: BertModel,
    classifier: Linear,
    tokenizer: Tokenizer,
    labels: Vec<BioTag>,
    device: Device,
}

#[derive(Clone)]
enum ExtractorBackend {
    Model(Arc<NerModel>),
    Stub,
}

/// Entity-tagging extractor for relevance keywords (supports stub mode).
#[derive(Clone)]
pub struct NerExtractor {
    backend: ExtractorBackend,
    config: NerConfig,
}

impl std::fmt::Debug for NerExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NerExtractor")
            .field(
                "backend",
                &match &self.backend {
                    ExtractorBackend::Model(m) => {
                        format!("Model({:?}, {} labels)", m.device, m.labels.len())
                    }
                    ExtractorBackend::Stub => "Stub".to_string(),
                },
            )
            .field("max_seq_len", &self.config.max_seq_len)
            .finish()
    }
}

impl NerExtractor {
    /// Loads the extractor from a config (stub mode is supported).
    pub fn load(config: NerConfig) -> Result<Self, ExtractionError> {
        config.validate()?;

        if config.testing_stub {
            warn!("NER extractor running in STUB mode (testing only)");
            return Ok(Self {
                backend: ExtractorBackend::Stub,
                config,
            });
        }

        let device = select_device();
        debug!(?device, "Selected compute device for NER extractor");

        let model = load_ner_model(&config.model_path, config.max_seq_len, &device)?;

        info!(
            model_path = %config.model_path.display(),
            num_labels = model.labels.len(),
            max_seq_len = config.max_seq_len,
            "NER model loaded"
        );

        Ok(Self {
            backend: ExtractorBackend::Model(Arc::new(model)),
            config,
        })
    }

    /// Loads a stub extractor.
    pub fn stub() -> Result<Self, ExtractionError> {
        Self::load(NerConfig::stub())
    }

    /// Returns `true` if running in stub mode.
    pub fn is_stub(&self) -> bool {
        matches!(self.backend, ExtractorBackend::Stub)
    }

    /// Returns the extractor configuration.
    pub fn config(&self) -> &NerConfig {
        &self.config
    }

    fn extract_with_model(model: &NerModel, text: &str) -> Result<Vec<TaggedToken>, ExtractionError> {
        let encoding =
            model
                .tokenizer
                .encode(text, true)
                .map_err(|e| ExtractionError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        let ids = encoding.get_ids();
        if ids.is_empty() {
            return Ok(vec![]);
        }

        debug!(
            text_len = text.len(),
            token_count = ids.len(),
            "Tagging tokens"
        );

        let input_ids = Tensor::new(ids, &model.device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), &model.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(encoding.get_attention_mask(), &model.device)?.unsqueeze(0)?;

        // [1, seq, hidden] -> [1, seq, num_labels]
        let hidden = model
            .bert
            .forward(&input_ids, &type_ids, Some(&attention_mask))?;
        let logits = model.classifier.forward(&hidden)?;

        let predicted: Vec<u32> = logits.argmax(D::Minus1)?.squeeze(0)?.to_vec1()?;

        let tokens = encoding.get_tokens();
        let special = encoding.get_special_tokens_mask();

        let mut tagged = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            if special.get(i).copied().unwrap_or(0) == 1 {
                continue;
            }

            let tag = predicted
                .get(i)
                .and_then(|id| model.labels.get(*id as usize))
                .copied()
                .unwrap_or(BioTag::OUTSIDE);

            tagged.push(TaggedToken::new(token.clone(), tag.class, tag.span_start));
        }

        Ok(tagged)
    }

    /// Heuristic stub tagger: capitalized surface tokens become entity span
    /// starts with a class picked deterministically from the token itself.
    fn extract_stub(&self, text: &str) -> Vec<TaggedToken> {
        use std::hash::{DefaultHasher, Hash, Hasher};

        text.split_whitespace()
            .map(|word| {
                let capitalized = word.chars().next().is_some_and(|c| c.is_uppercase());
                if capitalized {
                    let mut hasher = DefaultHasher::new();
                    word.hash(&mut hasher);
                    let class = match hasher.finish() % 4 {
                        0 => EntityClass::Misc,
                        1 => EntityClass::Loc,
                        2 => EntityClass::Per,
                        _ => EntityClass::Org,
                    };
                    TaggedToken::new(word, class, true)
                } else {
                    TaggedToken::new(word, EntityClass::Other, false)
                }
            })
            .collect()
    }
}

/// `config.json` fields beyond what the BERT encoder itself needs.
#[derive(Debug, Deserialize)]
struct HfLabelConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

fn load_ner_model(
    model_dir: &Path,
    max_seq_len: usize,
    device: &Device,
) -> Result<NerModel, ExtractionError> {
    let config_path = model_dir.join("config.json");
    let weights_path = model_dir.join("model.safetensors");

    let config_content = std::fs::read_to_string(&config_path)?;
    let bert_config: BertConfig =
        serde_json::from_str(&config_content).map_err(|e| ExtractionError::ModelLoadFailed {
            reason: format!("Failed to parse config.json: {}", e),
        })?;
    let label_config: HfLabelConfig =
        serde_json::from_str(&config_content).map_err(|e| ExtractionError::ModelLoadFailed {
            reason: format!("Failed to parse label table: {}", e),
        })?;

    let labels = parse_label_table(&label_config.id2label)?;

    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device).map_err(|e| {
            ExtractionError::ModelLoadFailed {
                reason: format!("Failed to map safetensors: {}", e),
            }
        })?
    };

    let bert = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
        BertModel::load(vb.pp("bert"), &bert_config)
    } else {
        BertModel::load(vb.clone(), &bert_config)
    }
    .map_err(|e| ExtractionError::ModelLoadFailed {
        reason: format!("Failed to load BERT encoder: {}", e),
    })?;

    let classifier = candle_nn::linear(bert_config.hidden_size, labels.len(), vb.pp("classifier"))
        .map_err(|e| ExtractionError::ModelLoadFailed {
            reason: format!("Failed to load classifier head: {}", e),
        })?;

    let tokenizer =
        load_tokenizer(model_dir, max_seq_len).map_err(|e| ExtractionError::TokenizationFailed {
            reason: format!("Failed to load tokenizer: {}", e),
        })?;

    Ok(NerModel {
        bert,
        classifier,
        tokenizer,
        labels,
        device: device.clone(),
    })
}

fn parse_label_table(id2label: &HashMap<String, String>) -> Result<Vec<BioTag>, ExtractionError> {
    if id2label.is_empty() {
        return Err(ExtractionError::InvalidConfig {
            reason: "config.json has no id2label table".to_string(),
        });
    }

    (0..id2label.len())
        .map(|id| {
            id2label
                .get(&id.to_string())
                .map(|label| BioTag::parse(label))
                .ok_or_else(|| ExtractionError::InvalidConfig {
                    reason: format!("id2label table is missing id {}", id),
                })
        })
        .collect()
}

impl KeywordExtractor for NerExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<TaggedToken>, ExtractionError> {
        match &self.backend {
            // Stub path is cheap; no reason to leave the async context.
            ExtractorBackend::Stub => Ok(self.extract_stub(text)),
            ExtractorBackend::Model(model) => {
                let model = model.clone();
                let text = text.to_string();

                tokio::task::spawn_blocking(move || Self::extract_with_model(&model, &text))
                    .await
                    .map_err(|e| ExtractionError::InferenceFailed {
                        reason: format!("extraction task panicked: {}", e),
                    })?
            }
        }
    }
}

/// Factory for lazily instantiating a [`NerExtractor`] through the loader.
#[derive(Debug, Clone)]
pub struct NerExtractorFactory {
    config: NerConfig,
}

impl NerExtractorFactory {
    pub fn new(config: NerConfig) -> Self {
        Self { config }
    }
}

impl CapabilityFactory for NerExtractorFactory {
    type Instance = NerExtractor;

    const KIND: CapabilityKind = CapabilityKind::KeywordExtraction;

    async fn create(
        &self,
        progress: Option<ProgressCallback>,
    ) -> Result<NerExtractor, ServiceLoadError> {
        crate::loader::report_progress(&progress, Self::KIND, 0.0);

        let config = self.config.clone();
        let extractor = tokio::task::spawn_blocking(move || NerExtractor::load(config))
            .await
            .map_err(|e| ServiceLoadError::InstantiationFailed {
                kind: Self::KIND,
                reason: format!("load task panicked: {}", e),
            })?
            .map_err(|e| ServiceLoadError::InstantiationFailed {
                kind: Self::KIND,
                reason: e.to_string(),
            })?;

        crate::loader::report_progress(&progress, Self::KIND, 1.0);
        Ok(extractor)
    }
}
