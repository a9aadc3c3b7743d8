//! LlmClient trait definition

use async_trait::async_trait;

use super::{GenerationRequest, GenerationResponse, LlmError};

/// Stateless generation client - each call is independent
///
/// One call is exactly one attempt against the endpoint. Implementations must
/// not retry internally: the attempt budget belongs to
/// [`crate::generator::SectionGenerator`].
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Endpoint identity (service address) for logs and errors
    fn endpoint(&self) -> &str;

    /// Send a single generation request and wait for the full text
    async fn complete(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;
}
