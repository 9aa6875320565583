use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Named strictness profile selecting a [`ThresholdSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SensitivityLevel {
    Flexible,
    #[default]
    Balanced,
    Strict,
}

/// Per-level score thresholds. Static configuration; never derived or
/// mutated at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSet {
    pub keyword: f32,
    pub similarity: f32,
    pub combined: f32,
}

const FLEXIBLE_THRESHOLDS: ThresholdSet = ThresholdSet {
    keyword: 0.40,
    similarity: 0.40,
    combined: 0.35,
};

const BALANCED_THRESHOLDS: ThresholdSet = ThresholdSet {
    keyword: 0.50,
    similarity: 0.50,
    combined: 0.44,
};

const STRICT_THRESHOLDS: ThresholdSet = ThresholdSet {
    keyword: 0.60,
    similarity: 0.60,
    combined: 0.55,
};

impl SensitivityLevel {
    /// Parses a level label; anything unrecognized falls back to `Balanced`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "flexible" => SensitivityLevel::Flexible,
            "strict" => SensitivityLevel::Strict,
            _ => SensitivityLevel::Balanced,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SensitivityLevel::Flexible => "flexible",
            SensitivityLevel::Balanced => "balanced",
            SensitivityLevel::Strict => "strict",
        }
    }

    /// Resolves the static threshold set for this level.
    pub fn thresholds(&self) -> ThresholdSet {
        match self {
            SensitivityLevel::Flexible => FLEXIBLE_THRESHOLDS,
            SensitivityLevel::Balanced => BALANCED_THRESHOLDS,
            SensitivityLevel::Strict => STRICT_THRESHOLDS,
        }
    }
}

impl std::fmt::Display for SensitivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SensitivityLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Unknown labels deserialize to Balanced instead of erroring; a host sending
// an unexpected profile gets reasonable behavior rather than a rejection.
impl<'de> Deserialize<'de> for SensitivityLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(SensitivityLevel::from_label(&label))
    }
}

/// Extracted page content as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub title: String,
    /// Extracted body text, capped upstream at
    /// [`MAIN_TEXT_MAX_CHARS`](crate::constants::MAIN_TEXT_MAX_CHARS).
    pub main_text: String,
}

impl PageData {
    pub fn new(title: impl Into<String>, main_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            main_text: main_text.into(),
        }
    }
}

/// Inbound analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub task: String,
    pub page_data: PageData,
    #[serde(default)]
    pub sensitivity: SensitivityLevel,
}

/// Outbound relevance verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelevanceVerdict {
    pub is_relevant: bool,
}

impl RelevanceVerdict {
    pub const RELEVANT: RelevanceVerdict = RelevanceVerdict { is_relevant: true };
    pub const NOT_RELEVANT: RelevanceVerdict = RelevanceVerdict { is_relevant: false };
}
