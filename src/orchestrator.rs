// src/orchestrator.rs
// Detect and humanize flows: validation, mock vs. upstream, direct vs. chunked

use crate::chunker::{chunk_text, word_count};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::llm::{
    extract_structured, generated_text, prompts, CompletionProvider, MockResponder, RouterClient,
    UpstreamPayload,
};
use crate::models::{DetectionResult, HumanizeMeta, HumanizeResult};
use crate::monitoring::metrics;
use futures_util::future::{AbortRegistration, Abortable};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const MAX_TEXT_CHARS: usize = 50_000;

/// Accept 1..=50000 characters, counted in UTF-16 code units like a
/// browser's `String.length`: characters outside the BMP count twice.
pub fn validate_text(text: &str) -> ApiResult<()> {
    if text.is_empty() {
        return Err(ApiError::Validation("Text is required".into()));
    }
    if text.encode_utf16().count() > MAX_TEXT_CHARS {
        return Err(ApiError::Validation(format!(
            "Text too long (max {} characters)",
            MAX_TEXT_CHARS
        )));
    }
    Ok(())
}

/// Run `fut` until it finishes or the paired `AbortHandle` fires. An aborted
/// request yields no partial result.
pub async fn cancellable<T, F>(fut: F, registration: AbortRegistration) -> ApiResult<T>
where
    F: Future<Output = ApiResult<T>>,
{
    match Abortable::new(fut, registration).await {
        Ok(result) => result,
        Err(_aborted) => {
            info!("Request cancelled before completion");
            Err(ApiError::Cancelled)
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub upstream_timeout: Duration,
    /// Humanize inputs above this many words are chunked.
    pub chunk_word_threshold: usize,
    pub chunk_max_chars: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            upstream_timeout: Duration::from_millis(120_000),
            chunk_word_threshold: 2000,
            chunk_max_chars: 2000,
        }
    }
}

impl From<&ApiConfig> for OrchestratorSettings {
    fn from(config: &ApiConfig) -> Self {
        Self {
            upstream_timeout: config.upstream_timeout(),
            chunk_word_threshold: config.chunk_word_threshold,
            chunk_max_chars: config.chunk_max_chars,
        }
    }
}

pub struct Orchestrator {
    /// `None` means no credential: every request takes the mock path.
    provider: Option<Arc<dyn CompletionProvider>>,
    mock: MockResponder,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        provider: Option<Arc<dyn CompletionProvider>>,
        mock: MockResponder,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            provider,
            mock,
            settings,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        let provider: Option<Arc<dyn CompletionProvider>> = if config.has_api_key() {
            info!(url = %config.router_api_url, model = %config.router_model, "Upstream model configured");
            Some(Arc::new(RouterClient::from_config(config)))
        } else {
            warn!("ROUTER_API_KEY not set - running in dev mode with mock responses");
            None
        };
        Self::new(provider, MockResponder::new(), OrchestratorSettings::from(config))
    }

    pub fn is_mock_mode(&self) -> bool {
        self.provider.is_none()
    }

    async fn call_upstream(
        &self,
        provider: &dyn CompletionProvider,
        prompt: &str,
    ) -> ApiResult<UpstreamPayload> {
        let started = Instant::now();
        let result = provider
            .complete_within(prompt, self.settings.upstream_timeout)
            .await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(ApiError::UpstreamTimeout { .. }) => "timeout",
            Err(ApiError::UpstreamError { .. }) => "status",
            Err(_) => "error",
        };
        metrics::record_upstream(outcome, latency_ms);
        debug!(model = provider.model_name(), outcome, latency_ms, "Upstream call finished");
        result
    }

    pub async fn detect(&self, text: &str) -> ApiResult<DetectionResult> {
        validate_text(text)?;

        let Some(provider) = self.provider.as_deref() else {
            debug!("Dev mode: using mock AI detector response");
            metrics::record_mock_substitution("unconfigured");
            return Ok(self.mock.mock_detect(text));
        };

        let prompt = prompts::detection_prompt(text);
        let payload = self.call_upstream(provider, &prompt).await?;

        match extract_structured(&payload) {
            Ok(result) => Ok(result),
            Err(ApiError::MalformedUpstreamOutput(reason)) => {
                warn!(%reason, "Unreadable detector output, substituting mock result");
                metrics::record_mock_substitution("malformed_output");
                Ok(self.mock.mock_detect(text))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn humanize(&self, text: &str) -> ApiResult<HumanizeResult> {
        validate_text(text)?;

        let Some(provider) = self.provider.as_deref() else {
            debug!("Dev mode: using mock humanizer response");
            metrics::record_mock_substitution("unconfigured");
            return Ok(self.mock.mock_humanize(text));
        };

        let words = word_count(text);
        if words <= self.settings.chunk_word_threshold {
            let prompt = prompts::humanize_prompt(text);
            let payload = self.call_upstream(provider, &prompt).await?;
            let rewritten = generated_text(&payload).unwrap_or(text).to_string();
            return Ok(build_humanize_result(text, rewritten, None));
        }

        let chunks = chunk_text(text, self.settings.chunk_max_chars);
        info!(words, chunks = chunks.len(), "Humanizing long text in chunks");

        let mut rewritten_chunks = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            let prompt = prompts::humanize_prompt(chunk);
            let rewritten = match self.call_upstream(provider, &prompt).await {
                Ok(payload) => generated_text(&payload).unwrap_or(chunk.as_str()).to_string(),
                Err(e) => {
                    warn!(chunk = i + 1, total = chunks.len(), error = %e, "Chunk failed, using mock rewrite");
                    metrics::record_mock_substitution("chunk_failure");
                    self.mock.mock_humanize(chunk).rewritten_text
                }
            };
            rewritten_chunks.push(rewritten);
            metrics::CHUNKS_PROCESSED_TOTAL.inc();
        }

        Ok(build_humanize_result(
            text,
            rewritten_chunks.join(" "),
            Some(chunks.len()),
        ))
    }
}

/// Word counts come from the final strings, not from per-chunk sums.
fn build_humanize_result(
    original: &str,
    rewritten: String,
    chunks_processed: Option<usize>,
) -> HumanizeResult {
    HumanizeResult {
        meta: HumanizeMeta {
            original_word_count: word_count(original),
            rewritten_word_count: word_count(&rewritten),
            chunks_processed,
        },
        rewritten_text: rewritten,
        original_text: original.to_string(),
    }
}
