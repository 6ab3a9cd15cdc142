//! Text embedding client.
//!
//! Query and document embeddings come from Gemini's `embedContent`
//! endpoint. The knowledge base was indexed with the same model, so query
//! vectors are directly comparable.

use matha_core::{AgentError, AgentResult};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Vector dimension of the `embedding-001` model.
pub const EMBEDDING_DIM: usize = 768;

/// Trait for text embedding providers.
#[async_trait::async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a single text into a vector.
    async fn embed(&self, text: &str) -> AgentResult<Vec<f32>>;
}

/// Gemini `embedContent` request format.
#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    content: EmbedContent,
}

#[derive(Debug, Serialize)]
struct EmbedContent {
    parts: Vec<EmbedPart>,
}

#[derive(Debug, Serialize)]
struct EmbedPart {
    text: String,
}

/// Gemini `embedContent` response format.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Option<EmbedValues>,
}

#[derive(Debug, Deserialize)]
struct EmbedValues {
    values: Vec<f32>,
}

/// Gemini embedding client.
pub struct GeminiEmbedder {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiEmbedder {
    /// Create a new embedder against the default endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, model)
    }

    /// Create a new embedder with a custom base URL (used in tests).
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl TextEmbedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> AgentResult<Vec<f32>> {
        tracing::debug!("Embedding {} bytes with {}", text.len(), self.model);

        let url = format!(
            "{}/v1beta/models/{}:embedContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = EmbedRequest {
            model: format!("models/{}", self.model),
            content: EmbedContent {
                parts: vec![EmbedPart {
                    text: text.to_string(),
                }],
            },
        };

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            AgentError::RetrievalUnavailable(format!("Failed to reach embedding API: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AgentError::RetrievalUnavailable(format!(
                "Embedding API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            AgentError::RetrievalUnavailable(format!("Failed to parse embedding response: {}", e))
        })?;

        parsed
            .embedding
            .map(|e| e.values)
            .filter(|values| !values.is_empty())
            .ok_or_else(|| {
                AgentError::RetrievalUnavailable(
                    "Unexpected embedding response format".to_string(),
                )
            })
    }
}
