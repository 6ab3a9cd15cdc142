//! Qdrant knowledge-base client.
//!
//! Talks to Qdrant over its REST API: point search for the retrieval path,
//! collection creation and point upsert for ingestion/retraining.
//! API: https://qdrant.tech/documentation/concepts/search/

use crate::embedding::{TextEmbedder, EMBEDDING_DIM};
use crate::types::{ProblemRecord, RetrievalHit, Retriever};
use matha_core::{AgentError, AgentResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Qdrant point identifier; the API accepts integers or UUID strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Str(String),
}

impl std::fmt::Display for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{}", n),
            PointId::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Search request body.
#[derive(Debug, Serialize)]
struct SearchRequest {
    vector: Vec<f32>,
    limit: usize,
    with_payload: bool,
}

/// Search response envelope.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: PointId,
    score: f32,
    payload: Option<ProblemRecord>,
}

/// Upsert request body.
#[derive(Debug, Serialize)]
struct UpsertRequest {
    points: Vec<UpsertPoint>,
}

#[derive(Debug, Serialize)]
pub struct UpsertPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: ProblemRecord,
}

/// Collection creation body.
#[derive(Debug, Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Debug, Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

/// Qdrant-backed knowledge base.
///
/// Owns the query-embedding step so callers see retrieval as a single
/// opaque capability: text in, scored records out.
pub struct QdrantKnowledgeBase {
    base_url: String,
    collection: String,
    embedder: Arc<dyn TextEmbedder>,
    client: reqwest::Client,
}

impl QdrantKnowledgeBase {
    /// Create a client for the given Qdrant endpoint and collection.
    pub fn new(
        base_url: impl Into<String>,
        collection: impl Into<String>,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            collection: collection.into(),
            embedder,
            client: reqwest::Client::new(),
        }
    }

    /// Create the collection if it does not exist (768-dim cosine vectors).
    ///
    /// Qdrant returns 409 for an existing collection; that is not an error
    /// for ingestion purposes.
    pub async fn ensure_collection(&self) -> AgentResult<()> {
        let url = format!("{}/collections/{}", self.base_url, self.collection);
        let body = CreateCollectionRequest {
            vectors: VectorParams {
                size: EMBEDDING_DIM,
                distance: "Cosine",
            },
        };

        let response = self.client.put(&url).json(&body).send().await.map_err(|e| {
            AgentError::RetrievalUnavailable(format!("Failed to reach Qdrant: {}", e))
        })?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::CONFLICT {
            tracing::debug!("Collection '{}' ready", self.collection);
            return Ok(());
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(AgentError::RetrievalUnavailable(format!(
            "Qdrant collection create failed ({}): {}",
            status, error_text
        )))
    }

    /// Upsert points into the collection, waiting for the write.
    pub async fn upsert(&self, points: Vec<UpsertPoint>) -> AgentResult<usize> {
        if points.is_empty() {
            return Ok(0);
        }

        let count = points.len();
        let url = format!(
            "{}/collections/{}/points?wait=true",
            self.base_url, self.collection
        );
        let body = UpsertRequest { points };

        let response = self.client.put(&url).json(&body).send().await.map_err(|e| {
            AgentError::RetrievalUnavailable(format!("Failed to reach Qdrant: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AgentError::RetrievalUnavailable(format!(
                "Qdrant upsert failed ({}): {}",
                status, error_text
            )));
        }

        tracing::info!("Upserted {} points into '{}'", count, self.collection);
        Ok(count)
    }
}

#[async_trait::async_trait]
impl Retriever for QdrantKnowledgeBase {
    async fn search(&self, query: &str, top_k: usize) -> AgentResult<Vec<RetrievalHit>> {
        let vector = self.embedder.embed(query).await?;

        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        );
        let body = SearchRequest {
            vector,
            limit: top_k,
            with_payload: true,
        };

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            AgentError::RetrievalUnavailable(format!("Failed to reach Qdrant: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AgentError::RetrievalUnavailable(format!(
                "Qdrant search failed ({}): {}",
                status, error_text
            )));
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| {
            AgentError::RetrievalUnavailable(format!("Failed to parse Qdrant response: {}", e))
        })?;

        let hits: Vec<RetrievalHit> = parsed
            .result
            .into_iter()
            .map(|point| RetrievalHit {
                score: point.score,
                id: point.id.to_string(),
                payload: point.payload.unwrap_or_default(),
            })
            .collect();

        tracing::debug!("Retrieved {} candidates for query", hits.len());
        Ok(hits)
    }
}
