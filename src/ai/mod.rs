//! Upstream generative-AI integration
//!
//! The proxy talks to the model through [`GenerationService`], implemented
//! by the Gemini REST client and by an in-memory mock for tests.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::GeminiGenerationClient;
pub use mock::MockGenerationClient;

use crate::Result;
use async_trait::async_trait;
use gemini::types::GenerateContentRequest;

/// Everything needed for one upstream call, minus the credential.
#[derive(Debug, Clone)]
pub struct UpstreamCall {
    pub model: String,
    pub request: GenerateContentRequest,
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Run one `generateContent` call and return the model's text.
    async fn generate(&self, api_key: &str, call: &UpstreamCall) -> Result<String>;
}
