//! Retrieval type definitions.

use matha_core::AgentResult;
use serde::{Deserialize, Serialize};

/// A worked problem stored in the knowledge base.
///
/// The payload behind every knowledge-base point: the original question,
/// a free-text steps blob, and the final answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProblemRecord {
    /// Original question text
    #[serde(default)]
    pub question: String,

    /// Worked steps (free text, possibly multi-line)
    #[serde(default)]
    pub steps: String,

    /// Final answer string
    #[serde(default)]
    pub final_answer: String,
}

impl ProblemRecord {
    /// Combined text used for embedding, matching the ingestion format.
    pub fn embedding_text(&self) -> String {
        format!(
            "Q: {} A: {} Steps: {}",
            self.question, self.final_answer, self.steps
        )
    }
}

/// A single similarity-search candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalHit {
    /// Similarity score, conventionally 0–1 for cosine distance
    pub score: f32,

    /// Knowledge-base record identifier
    pub id: String,

    /// The stored worked problem
    pub payload: ProblemRecord,
}

/// Trait for similarity retrieval over the knowledge base.
///
/// Results come back ordered by descending score. The orchestrator issues
/// at most one search per request.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Search for the `top_k` records most similar to the query.
    async fn search(&self, query: &str, top_k: usize) -> AgentResult<Vec<RetrievalHit>>;
}
