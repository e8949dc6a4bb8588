//! HTTP client for a hosted generation endpoint.
//!
//! The endpoint takes `{message, flowId?, variables?, userId?}` and answers
//! `{response, model?}` on success or `{error}` on failure.

use super::{GenerationRequest, GenerationSource, Generated, TextGenerator};
use crate::error::{PromptlyError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;

pub struct HttpGenerator {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EndpointReply {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl EndpointReply {
    pub(crate) fn into_generated(self) -> Result<Generated> {
        if let Some(error) = self.error {
            return Err(PromptlyError::GenerationError(error));
        }
        let text = self.response.ok_or_else(|| {
            PromptlyError::GenerationError("endpoint reply has no 'response' field".to_string())
        })?;
        Ok(Generated {
            text,
            model: self.model,
            source: GenerationSource::Service,
        })
    }
}

impl HttpGenerator {
    pub fn new(endpoint: String, api_key: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                PromptlyError::GenerationError(format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl TextGenerator for HttpGenerator {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generated> {
        let start = Instant::now();
        debug!(endpoint = %self.endpoint, flow = ?request.flow_id, "generation request");

        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            PromptlyError::GenerationError(format!("request to '{}' failed: {}", self.endpoint, e))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            PromptlyError::GenerationError(format!("failed to read response body: {}", e))
        })?;

        // Error bodies usually carry {"error": ...}; prefer that message.
        let reply: Option<EndpointReply> = serde_json::from_str(&body).ok();
        if !status.is_success() {
            let detail = reply
                .and_then(|r| r.error)
                .unwrap_or_else(|| body.chars().take(200).collect());
            return Err(PromptlyError::GenerationError(format!(
                "endpoint returned {}: {}",
                status, detail
            )));
        }

        let reply = reply.ok_or_else(|| {
            PromptlyError::GenerationError("endpoint returned invalid JSON".to_string())
        })?;
        let generated = reply.into_generated()?;
        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            model = ?generated.model,
            "generation complete"
        );
        Ok(generated)
    }
}
