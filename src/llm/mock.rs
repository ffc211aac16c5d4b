// src/llm/mock.rs
// Local stand-in for the upstream model: used when no API key is configured,
// when detection output is unreadable, and for failed humanize chunks.

use crate::chunker::word_count;
use crate::models::{Confidence, DetectionResult, HumanizeMeta, HumanizeResult};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::{Captures, Regex};

static TRANSITIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(However|Therefore|Additionally|Furthermore), ").expect("static regex")
});

fn casual_form(formal: &str) -> &'static str {
    match formal {
        "However" => "But ",
        "Therefore" => "So ",
        "Additionally" => "Also, ",
        _ => "And ",
    }
}

/// Literal phrase substitutions; no randomness.
pub fn humanize_text(text: &str) -> String {
    TRANSITIONS
        .replace_all(text, |caps: &Captures| casual_form(&caps[1]))
        .into_owned()
}

/// Mock detection reasoning strength, coarser than the confidence banding.
fn strength(probability: u8) -> &'static str {
    if probability >= 60 {
        "strong"
    } else if probability >= 30 {
        "moderate"
    } else {
        "weak"
    }
}

pub fn detection_for(text: &str, probability: u8) -> DetectionResult {
    let probability = probability.min(100);
    DetectionResult {
        ai_probability: probability,
        confidence: Confidence::from_probability(probability),
        reasoning: format!(
            "This {}-word text shows {} indicators of AI generation based on sentence structure patterns and word choice consistency.",
            word_count(text),
            strength(probability)
        ),
    }
}

pub struct MockResponder {
    rng: Mutex<StdRng>,
}

impl MockResponder {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible probabilities, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn mock_detect(&self, text: &str) -> DetectionResult {
        let probability = self.rng.lock().gen_range(0..=100u8);
        detection_for(text, probability)
    }

    pub fn mock_humanize(&self, text: &str) -> HumanizeResult {
        let rewritten = humanize_text(text);
        HumanizeResult {
            meta: HumanizeMeta {
                original_word_count: word_count(text),
                rewritten_word_count: word_count(&rewritten),
                chunks_processed: None,
            },
            rewritten_text: rewritten,
            original_text: text.to_string(),
        }
    }
}

impl Default for MockResponder {
    fn default() -> Self {
        Self::new()
    }
}
