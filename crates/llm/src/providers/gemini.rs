//! Gemini generation provider.
//!
//! Calls the Generative Language API (`models/{model}:generateContent`) and
//! extracts clean text from the candidate structure.
//! API: https://ai.google.dev/api/generate-content

use crate::client::{GenerateRequest, GenerateResponse, GenerateUsage, Generator};
use crate::sanitize::strip_filler;
use matha_core::{AgentError, AgentResult};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini API request format.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

/// Gemini API response format.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize, Default)]
struct GeminiUsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}

/// Gemini generation client.
pub struct GeminiClient {
    /// Base URL for the Generative Language API
    base_url: String,

    /// API key (passed as a query parameter)
    api_key: String,

    /// HTTP client
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new Gemini client with the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Create a new Gemini client with a custom base URL (used in tests).
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Convert a GenerateRequest to the Gemini wire format.
    fn to_gemini_request(&self, request: &GenerateRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature.unwrap_or(0.0),
                max_output_tokens: request.max_tokens.unwrap_or(512),
            },
        }
    }

    /// Pull the text out of the first candidate, tolerating missing parts.
    fn extract_text(response: &GeminiResponse) -> String {
        response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.first())
            .map(|part| part.text.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Generator for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &GenerateRequest) -> AgentResult<GenerateResponse> {
        tracing::info!("Sending generation request to Gemini");
        tracing::debug!("Model: {}, prompt bytes: {}", request.model, request.prompt.len());

        let gemini_request = self.to_gemini_request(request);
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, request.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| {
                AgentError::GenerationUnavailable(format!("Failed to reach Gemini: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AgentError::GenerationUnavailable(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            AgentError::GenerationUnavailable(format!("Failed to parse Gemini response: {}", e))
        })?;

        let raw = Self::extract_text(&gemini_response);
        if raw.is_empty() {
            tracing::warn!("Gemini returned no candidate text");
        }

        let usage = gemini_response.usage_metadata.unwrap_or_default();

        tracing::info!("Received generation from Gemini ({} bytes)", raw.len());

        Ok(GenerateResponse {
            content: strip_filler(&raw),
            model: request.model.clone(),
            usage: GenerateUsage::new(usage.prompt_token_count, usage.candidates_token_count),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_text(text: &str) -> GeminiResponse {
        GeminiResponse {
            candidates: vec![GeminiCandidate {
                content: Some(GeminiContent {
                    role: Some("model".to_string()),
                    parts: vec![GeminiPart {
                        text: text.to_string(),
                    }],
                }),
            }],
            usage_metadata: None,
        }
    }

    #[test]
    fn test_extract_text() {
        let response = response_with_text("1. Apply the chain rule");
        assert_eq!(GeminiClient::extract_text(&response), "1. Apply the chain rule");
    }

    #[test]
    fn test_extract_text_empty_candidates() {
        let response = GeminiResponse {
            candidates: vec![],
            usage_metadata: None,
        };
        assert_eq!(GeminiClient::extract_text(&response), "");
    }

    #[test]
    fn test_request_conversion_defaults() {
        let client = GeminiClient::new("key");
        let request = GenerateRequest::new("Integrate 2x dx", "gemini-2.5-flash");
        let wire = client.to_gemini_request(&request);

        assert_eq!(wire.contents.len(), 1);
        assert_eq!(wire.contents[0].parts[0].text, "Integrate 2x dx");
        assert_eq!(wire.generation_config.max_output_tokens, 512);
        assert_eq!(wire.generation_config.temperature, 0.0);
    }

    #[test]
    fn test_response_deserialization() {
        let body = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Final Answer: 4"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 5}
        }"#;

        let parsed: GeminiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(GeminiClient::extract_text(&parsed), "Final Answer: 4");
        assert_eq!(parsed.usage_metadata.unwrap().prompt_token_count, 12);
    }
}
