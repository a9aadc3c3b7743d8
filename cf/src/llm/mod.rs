//! Generation client module
//!
//! Provides the endpoint trait, its request/response types and the concrete
//! providers.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod gradio;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use gradio::GradioClient;
pub use openai::OpenAiClient;
pub use types::{GenerationRequest, GenerationResponse, TEMPERATURE_RANGE};

use crate::config::LlmConfig;

/// Create a generation client based on the provider specified in config
///
/// Supports "gradio" and "openai" providers.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, base_url = %config.base_url, "create_client: called");
    match config.provider.as_str() {
        "gradio" => {
            debug!("create_client: creating Gradio client");
            Ok(Arc::new(GradioClient::from_config(config)?))
        }
        "openai" => {
            debug!("create_client: creating OpenAI client");
            Ok(Arc::new(OpenAiClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::Config(format!(
                "Unknown LLM provider: '{}'. Supported: gradio, openai",
                other
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_gradio_client_without_key() {
        let config = LlmConfig {
            api_key_env: "CHAPTERFORGE_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        let client = create_client(&config).unwrap();
        assert_eq!(client.endpoint(), config.base_url);
    }

    #[test]
    fn test_create_unknown_provider() {
        let config = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        let err = create_client(&config).err().unwrap();
        assert!(err.to_string().contains("carrier-pigeon"));
    }
}
