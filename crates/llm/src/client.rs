//! Generator client abstraction and request/response types.
//!
//! The orchestrator treats text generation as an opaque capability: a prompt
//! goes in, raw text comes out. Providers live behind the `Generator` trait.

use matha_core::AgentResult;
use serde::{Deserialize, Serialize};

/// Text generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The prompt text to send to the model
    pub prompt: String,

    /// Model identifier (e.g., "gemini-2.5-flash")
    pub model: String,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl GenerateRequest {
    /// Create a new request with required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Text generation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The generated text, cleaned of leading conversational filler
    pub content: String,

    /// Model that generated the response
    pub model: String,

    /// Token usage statistics
    pub usage: GenerateUsage,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerateUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl GenerateUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Trait for text-generation providers.
///
/// Implementations perform exactly one remote call per `generate` invocation
/// and enforce their own timeouts; the orchestrator never retries.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    /// Get the provider name (e.g., "gemini").
    fn provider_name(&self) -> &str;

    /// Generate text from a prompt.
    async fn generate(&self, request: &GenerateRequest) -> AgentResult<GenerateResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = GenerateRequest::new("Solve x^2 = 4", "gemini-2.5-flash")
            .with_max_tokens(512)
            .with_temperature(0.0);

        assert_eq!(request.prompt, "Solve x^2 = 4");
        assert_eq!(request.model, "gemini-2.5-flash");
        assert_eq!(request.max_tokens, Some(512));
        assert_eq!(request.temperature, Some(0.0));
    }

    #[test]
    fn test_usage_totals() {
        let usage = GenerateUsage::new(120, 80);
        assert_eq!(usage.total_tokens, 200);
    }
}
