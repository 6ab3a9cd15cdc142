//! CLI command handlers.

mod ask;
mod eval;
mod feedback;
mod kb;

pub use ask::AskCommand;
pub use eval::EvalCommand;
pub use feedback::FeedbackCommand;
pub use kb::KbCommand;

use matha_core::{AgentConfig, AgentResult};
use matha_retrieval::{GeminiEmbedder, QdrantKnowledgeBase};
use std::sync::Arc;

/// Build the Qdrant knowledge base with a Gemini query embedder.
pub(crate) fn build_knowledge_base(config: &AgentConfig) -> AgentResult<QdrantKnowledgeBase> {
    let api_key = config.require_google_api_key()?;
    let embedder = Arc::new(GeminiEmbedder::new(api_key, &config.embed_model));
    Ok(QdrantKnowledgeBase::new(
        &config.qdrant_url,
        &config.collection,
        embedder,
    ))
}
