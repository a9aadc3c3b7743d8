//! Generation request/response types
//!
//! The endpoint contract is a single-shot call: one user prompt, one system
//! context string, a token budget and a temperature. Providers translate this
//! into their own wire format.

use tracing::debug;

/// Accepted temperature range
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

/// A generation request - everything needed for one endpoint call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// User prompt (the instruction for this unit)
    pub prompt: String,

    /// System context (chapter brief or windowed conversation)
    pub system_context: String,

    /// Max tokens for the response
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        system_context: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        let prompt = prompt.into();
        let system_context = system_context.into();
        debug!(
            prompt_len = prompt.len(),
            system_len = system_context.len(),
            max_tokens,
            temperature,
            "GenerationRequest::new: called"
        );
        Self {
            prompt,
            system_context,
            max_tokens,
            temperature,
        }
    }

    /// Check the request against the endpoint contract
    ///
    /// Returns a description of the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err("prompt must not be empty".to_string());
        }
        if self.system_context.trim().is_empty() {
            return Err("system context must not be empty".to_string());
        }
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than zero".to_string());
        }
        if !TEMPERATURE_RANGE.contains(&self.temperature) {
            return Err(format!(
                "temperature {} outside {}..={}",
                self.temperature,
                TEMPERATURE_RANGE.start(),
                TEMPERATURE_RANGE.end()
            ));
        }
        Ok(())
    }
}

/// Raw text returned by the endpoint
///
/// May still carry the leading role marker; see [`crate::text::clean_generated_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResponse {
    pub text: String,
}

impl GenerationResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request() {
        let req = GenerationRequest::new("Write chapter one", "You are an author", 4000, 0.6);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_prompt_and_context() {
        let req = GenerationRequest::new("  ", "ctx", 10, 0.5);
        assert!(req.validate().unwrap_err().contains("prompt"));

        let req = GenerationRequest::new("p", "", 10, 0.5);
        assert!(req.validate().unwrap_err().contains("system context"));
    }

    #[test]
    fn test_rejects_zero_tokens_and_bad_temperature() {
        let req = GenerationRequest::new("p", "c", 0, 0.5);
        assert!(req.validate().unwrap_err().contains("max_tokens"));

        let req = GenerationRequest::new("p", "c", 10, 2.5);
        assert!(req.validate().unwrap_err().contains("temperature"));

        let req = GenerationRequest::new("p", "c", 10, -0.1);
        assert!(req.validate().is_err());
    }
}
