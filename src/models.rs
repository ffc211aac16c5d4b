// src/models.rs
// Request/response shapes shared by the orchestrator and the HTTP layer

use serde::{Deserialize, Serialize};

/// Body of both `POST /api/check` and `POST /api/humanize`.
#[derive(Debug, Clone, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Confidence {
    #[serde(rename = "Very confident")]
    VeryConfident,
    #[serde(rename = "Maybe")]
    Maybe,
    #[serde(rename = "Not confident")]
    NotConfident,
}

impl Confidence {
    /// Fixed banding: 0–39 not confident, 40–79 maybe, 80–100 very confident.
    pub fn from_probability(probability: u8) -> Self {
        match probability {
            80..=u8::MAX => Self::VeryConfident,
            40..=79 => Self::Maybe,
            _ => Self::NotConfident,
        }
    }

    /// Lenient label parsing for model output ("very confident", "Maybe ", ...).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "very confident" => Some(Self::VeryConfident),
            "maybe" => Some(Self::Maybe),
            "not confident" => Some(Self::NotConfident),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryConfident => "Very confident",
            Self::Maybe => "Maybe",
            Self::NotConfident => "Not confident",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectionResult {
    pub ai_probability: u8,
    pub confidence: Confidence,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HumanizeMeta {
    pub original_word_count: usize,
    pub rewritten_word_count: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub chunks_processed: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HumanizeResult {
    pub rewritten_text: String,
    pub original_text: String,
    pub meta: HumanizeMeta,
}
