//! Gradio call-API client
//!
//! Hosted chat demos (Hugging Face Spaces) expose their `/chat` handler through
//! Gradio's two-step HTTP API: a POST queues the call and returns an event id,
//! a GET on that id streams server-sent events until `complete` (or `error`).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{GenerationRequest, GenerationResponse, LlmClient, LlmError};
use crate::config::LlmConfig;

/// Gradio Space client
pub struct GradioClient {
    base_url: String,
    api_name: String,
    api_key: Option<String>,
    http: Client,
    timeout: Duration,
}

impl GradioClient {
    /// Create a new client from configuration
    ///
    /// The API key is optional; public Spaces accept anonymous calls.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(?config, "from_config: called");
        let timeout = config.timeout();
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_name: config.api_name.trim_matches('/').to_string(),
            api_key: config.api_key(),
            http,
            timeout,
        })
    }

    fn call_url(&self) -> String {
        format!("{}/gradio_api/call/{}", self.base_url, self.api_name)
    }

    /// Positional payload for the chat handler:
    /// `(message, system_prompt, max_new_tokens, temperature)`
    fn build_request_body(&self, request: &GenerationRequest) -> serde_json::Value {
        debug!(%request.max_tokens, "build_request_body: called");
        serde_json::json!({
            "data": [
                request.prompt,
                request.system_context,
                request.max_tokens,
                request.temperature,
            ]
        })
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {}", key)),
            None => builder,
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Network(e)
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
        let status = response.status().as_u16();
        if status == 429 {
            debug!("check_status: rate limited (429)");
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }
        if !response.status().is_success() {
            debug!(%status, "check_status: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }
        Ok(response)
    }
}

/// Extract the generated text from a Gradio event stream body
///
/// Only the `complete` event carries the final output; `generating` events
/// hold partial text and `heartbeat` events carry nothing.
pub(crate) fn parse_event_stream(body: &str) -> Result<String, LlmError> {
    debug!(body_len = body.len(), "parse_event_stream: called");
    let mut event = "";

    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim();
            continue;
        }
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();

        match event {
            "complete" => {
                debug!("parse_event_stream: complete event");
                let values: Vec<serde_json::Value> = serde_json::from_str(data)?;
                return values
                    .into_iter()
                    .next()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .ok_or_else(|| LlmError::InvalidResponse(format!("complete event without text output: {}", data)));
            }
            "error" => {
                debug!(%data, "parse_event_stream: error event");
                return Err(LlmError::ApiError {
                    status: 500,
                    message: format!("endpoint reported error: {}", data),
                });
            }
            _ => {}
        }
    }

    Err(LlmError::InvalidResponse(
        "event stream ended without a complete event".to_string(),
    ))
}

#[derive(Debug, Deserialize)]
struct QueuedCall {
    event_id: String,
}

#[async_trait]
impl LlmClient for GradioClient {
    fn endpoint(&self) -> &str {
        &self.base_url
    }

    async fn complete(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        debug!(endpoint = %self.base_url, api = %self.api_name, "complete: called");
        let url = self.call_url();
        let body = self.build_request_body(&request);

        let response = self
            .authorize(self.http.post(&url))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let queued: QueuedCall = Self::check_status(response).await?.json().await?;
        debug!(event_id = %queued.event_id, "complete: call queued");

        let response = self
            .authorize(self.http.get(format!("{}/{}", url, queued.event_id)))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let stream = Self::check_status(response)
            .await?
            .text()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let text = parse_event_stream(&stream)?;
        debug!(text_len = text.len(), "complete: success");
        Ok(GenerationResponse::new(text))
    }
}
