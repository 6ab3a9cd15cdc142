//! Knowledge-base ingestion and retraining.
//!
//! Offline maintenance of the Qdrant collection: bulk-load worked problems
//! from a JSON file, and fold positively-rated feedback back into the base.
//! Neither runs on the request path.

use crate::embedding::TextEmbedder;
use crate::qdrant::{QdrantKnowledgeBase, UpsertPoint};
use crate::types::ProblemRecord;
use matha_core::{AgentError, AgentResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Embedding calls are issued per record; batching bounds upsert sizes.
const BATCH_SIZE: usize = 10;

/// Point-id offset for feedback-derived records, keeping them apart from
/// the bulk-loaded id space.
pub const FEEDBACK_ID_BASE: u64 = 1_000_000;

/// A knowledge-base record as stored in the ingestion file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbRecord {
    /// Numeric point id
    pub id: u64,

    #[serde(flatten)]
    pub problem: ProblemRecord,
}

/// Load records from a JSON array file.
pub fn load_records(path: &Path) -> AgentResult<Vec<KbRecord>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AgentError::Config(format!("Failed to read {:?}: {}", path, e)))?;

    let records: Vec<KbRecord> = serde_json::from_str(&contents)?;
    tracing::info!("Loaded {} records from {:?}", records.len(), path);
    Ok(records)
}

/// Embed and upsert records into the knowledge base in batches.
///
/// Returns the number of points written.
pub async fn ingest(
    kb: &QdrantKnowledgeBase,
    embedder: &dyn TextEmbedder,
    records: &[KbRecord],
) -> AgentResult<usize> {
    kb.ensure_collection().await?;

    let mut written = 0;
    for batch in records.chunks(BATCH_SIZE) {
        let mut points = Vec::with_capacity(batch.len());
        for record in batch {
            let vector = embedder.embed(&record.problem.embedding_text()).await?;
            points.push(UpsertPoint {
                id: record.id,
                vector,
                payload: record.problem.clone(),
            });
        }

        written += kb.upsert(points).await?;
        tracing::info!("Embedded {}/{} records", written, records.len());
    }

    Ok(written)
}

/// Upsert question/answer pairs gathered from positive feedback.
///
/// Each pair becomes a record with no steps blob; ids are assigned
/// sequentially from `FEEDBACK_ID_BASE`.
pub async fn retrain_from_pairs(
    kb: &QdrantKnowledgeBase,
    embedder: &dyn TextEmbedder,
    pairs: &[(String, String)],
) -> AgentResult<usize> {
    if pairs.is_empty() {
        tracing::info!("No qualifying feedback to process");
        return Ok(0);
    }

    let records: Vec<KbRecord> = pairs
        .iter()
        .enumerate()
        .map(|(i, (question, answer))| KbRecord {
            id: FEEDBACK_ID_BASE + i as u64,
            problem: ProblemRecord {
                question: question.clone(),
                steps: String::new(),
                final_answer: answer.clone(),
            },
        })
        .collect();

    ingest(kb, embedder, &records).await
}
