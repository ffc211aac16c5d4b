// src/llm/router_client.rs
// Bearer-authenticated client for the router completion API

use super::provider::{CompletionProvider, UpstreamPayload};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

#[derive(Serialize)]
struct RouterRequest<'a> {
    model: &'a str,
    input: &'a str,
}

pub struct RouterClient {
    url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl RouterClient {
    pub fn new(url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            url,
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(
            config.router_api_url.clone(),
            config.router_api_key.clone(),
            config.router_model.clone(),
        )
    }
}

#[async_trait::async_trait]
impl CompletionProvider for RouterClient {
    async fn complete(&self, prompt: &str) -> ApiResult<UpstreamPayload> {
        // Credential check happens before any network I/O
        let api_key = self.api_key.as_deref().ok_or(ApiError::UpstreamUnconfigured)?;

        debug!(model = %self.model, prompt_len = prompt.len(), "Calling router API");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&RouterRequest {
                model: &self.model,
                input: prompt,
            })
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %self.url, "Router API returned an error status");
            return Err(ApiError::UpstreamError {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Transport(format!("invalid response body: {}", e)))?;

        info!(model = %self.model, "Router API call complete");
        Ok(UpstreamPayload::from_json(body))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
