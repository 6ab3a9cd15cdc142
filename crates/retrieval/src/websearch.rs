//! Web-search fallback client.
//!
//! When the knowledge base has nothing similar enough, the agent asks
//! Serper.dev (a Google Search API) for context snippets. An empty context
//! is a valid outcome, not an error: a missing API key or an API-side
//! failure degrades to "" with a warning, and the generator solves from
//! first principles.

use matha_core::{AgentError, AgentResult};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://google.serper.dev";

/// Number of organic results requested per search.
const RESULT_COUNT: u32 = 3;

/// Trait for web-search context providers.
#[async_trait::async_trait]
pub trait WebSearch: Send + Sync {
    /// Fetch newline-joined context snippets for a query.
    ///
    /// Returns an empty string when no context is available.
    async fn search(&self, query: &str) -> AgentResult<String>;
}

/// Serper.dev search request.
#[derive(Debug, Serialize)]
struct SerperRequest {
    q: String,
    num: u32,
}

/// Serper.dev search response (only the organic snippets matter here).
#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Debug, Deserialize)]
struct SerperResult {
    snippet: Option<String>,
}

/// Serper.dev web-search client.
pub struct SerperClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl SerperClient {
    /// Create a client. Without an API key every search yields "".
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Create a client with a custom base URL (used in tests).
    pub fn with_base_url(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Join organic snippets into a single context block.
    fn join_snippets(response: SerperResponse) -> String {
        response
            .organic
            .into_iter()
            .filter_map(|result| result.snippet)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait::async_trait]
impl WebSearch for SerperClient {
    async fn search(&self, query: &str) -> AgentResult<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("SERPER_API_KEY not set; skipping web search");
            return Ok(String::new());
        };

        let url = format!("{}/search", self.base_url);
        let body = SerperRequest {
            q: query.to_string(),
            num: RESULT_COUNT,
        };

        let response = self
            .client
            .post(&url)
            .header("X-API-KEY", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Other(format!("Web search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!("Web search API error ({}): {}", status, error_text);
            return Ok(String::new());
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Other(format!("Failed to parse search response: {}", e)))?;

        let context = Self::join_snippets(parsed);
        tracing::debug!("Web search returned {} bytes of context", context.len());
        Ok(context)
    }
}
