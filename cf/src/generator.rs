//! Bounded fixed-delay retry around a generation client
//!
//! Every failure (network, endpoint status, malformed or empty output) costs
//! one attempt and a fixed pause. No exponential growth, no jitter and no state
//! carried between attempts: each retry re-sends the identical request.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::GenerationConfig;
use crate::llm::{GenerationRequest, LlmClient, LlmError};
use crate::text::clean_generated_text;

/// Errors from a retried generation
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Failed to generate content from {endpoint} after {attempts} attempts: {last_error}")]
    Exhausted {
        endpoint: String,
        attempts: u32,
        #[source]
        last_error: LlmError,
    },

    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),
}

impl GenerationError {
    /// Number of attempts made before giving up (zero for rejected requests)
    pub fn attempts(&self) -> u32 {
        match self {
            GenerationError::Exhausted { attempts, .. } => *attempts,
            GenerationError::InvalidRequest(_) => 0,
        }
    }
}

/// Attempt budget and the pause after each failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff: Duration::from_secs(5),
        }
    }
}

impl From<&GenerationConfig> for RetryPolicy {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: config.backoff(),
        }
    }
}

/// Retrying wrapper around an [`LlmClient`]
#[derive(Clone)]
pub struct SectionGenerator {
    client: Arc<dyn LlmClient>,
    policy: RetryPolicy,
}

impl SectionGenerator {
    pub fn new(client: Arc<dyn LlmClient>, policy: RetryPolicy) -> Self {
        debug!(endpoint = %client.endpoint(), ?policy, "SectionGenerator::new: called");
        Self { client, policy }
    }

    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Generate raw text for one unit
    ///
    /// Calls the endpoint up to `max_retries` times, pausing `backoff` after
    /// each failure. Output that is empty once cleaned counts as a failure.
    /// Returns the raw (uncleaned) text of the first successful attempt.
    pub async fn generate(
        &self,
        prompt: &str,
        system_context: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let request = GenerationRequest::new(prompt, system_context, max_tokens, temperature);
        request.validate().map_err(GenerationError::InvalidRequest)?;
        if self.policy.max_retries == 0 {
            return Err(GenerationError::InvalidRequest(
                "max_retries must be at least 1".to_string(),
            ));
        }

        let endpoint = self.client.endpoint();
        let max_retries = self.policy.max_retries;
        let mut last_error = None;

        for attempt in 1..=max_retries {
            info!(%endpoint, attempt, max_retries, "Attempting to generate content");

            let outcome = self.client.complete(request.clone()).await.and_then(|response| {
                if clean_generated_text(&response.text).is_empty() {
                    Err(LlmError::EmptyResponse)
                } else {
                    Ok(response.text)
                }
            });

            match outcome {
                Ok(text) => {
                    info!(%endpoint, attempt, max_retries, outcome = "ok", words = crate::text::word_count(&text), "Generation succeeded");
                    return Ok(text);
                }
                Err(e) => {
                    warn!(
                        %endpoint,
                        attempt,
                        max_retries,
                        outcome = %e,
                        retryable = e.is_retryable(),
                        "Generation attempt failed"
                    );
                    last_error = Some(e);
                    // The pause follows every failure, the last one included
                    debug!(backoff_ms = self.policy.backoff.as_millis() as u64, "generate: backing off");
                    tokio::time::sleep(self.policy.backoff).await;
                }
            }
        }

        Err(GenerationError::Exhausted {
            endpoint: endpoint.to_string(),
            attempts: max_retries,
            last_error: last_error.unwrap_or_else(|| LlmError::InvalidResponse("no attempt was made".to_string())),
        })
    }
}
