//! Retrieval crate for the Matha agent.
//!
//! External capabilities around the knowledge base: Gemini text embeddings,
//! Qdrant similarity search (with upsert for ingestion/retraining), and the
//! Serper.dev web-search fallback. The orchestrator sees only the
//! `Retriever` and `WebSearch` traits.

pub mod embedding;
pub mod ingest;
pub mod qdrant;
pub mod types;
pub mod websearch;

// Re-export main types
pub use embedding::{GeminiEmbedder, TextEmbedder, EMBEDDING_DIM};
pub use qdrant::QdrantKnowledgeBase;
pub use types::{ProblemRecord, RetrievalHit, Retriever};
pub use websearch::{SerperClient, WebSearch};
