// src/llm/provider.rs
// Upstream completion abstraction - the remote model is an opaque black box

use crate::error::{ApiError, ApiResult};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Raw upstream reply with the fields we know how to read pulled out.
///
/// `output` wins over `text`; when neither is a non-empty string the whole
/// `raw` document is the fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamPayload {
    pub output: Option<String>,
    pub text: Option<String>,
    pub raw: Value,
}

impl UpstreamPayload {
    pub fn from_json(raw: Value) -> Self {
        let field = |name: &str| {
            raw.get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            output: field("output"),
            text: field("text"),
            raw,
        }
    }

    /// Convenience for fakes: a payload carrying only `output`.
    pub fn with_output(output: impl Into<String>) -> Self {
        Self::from_json(serde_json::json!({ "output": output.into() }))
    }
}

/// Implement this to plug in a different completion backend.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// One outbound call, no time bound of its own.
    async fn complete(&self, prompt: &str) -> ApiResult<UpstreamPayload>;

    fn model_name(&self) -> &str;

    /// `complete` bounded by `timeout`. The in-flight call is dropped on expiry.
    async fn complete_within(&self, prompt: &str, timeout: Duration) -> ApiResult<UpstreamPayload> {
        bounded(self.complete(prompt), timeout).await
    }
}

/// Race `fut` against `timeout`; the loser is dropped, which releases the timer
/// and any connection held by the call.
pub async fn bounded<T, F>(fut: F, timeout: Duration) -> ApiResult<T>
where
    F: Future<Output = ApiResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            let timeout_ms = timeout.as_millis() as u64;
            warn!(timeout_ms, "Upstream call timed out");
            Err(ApiError::UpstreamTimeout { timeout_ms })
        }
    }
}
