//! Knowledge base command handler.
//!
//! Offline maintenance of the Qdrant collection: bulk ingestion from a
//! JSON file, retraining from positive feedback, and ad-hoc similarity
//! search for inspection.

use clap::{Args, Subcommand};
use matha_agent::FeedbackLog;
use matha_core::{AgentConfig, AgentResult};
use matha_retrieval::{ingest, GeminiEmbedder, Retriever};
use std::path::PathBuf;

/// Knowledge base maintenance
#[derive(Args, Debug)]
pub struct KbCommand {
    #[command(subcommand)]
    pub action: KbAction,
}

#[derive(Subcommand, Debug)]
pub enum KbAction {
    /// Bulk-load worked problems from a JSON file
    Ingest(KbIngestCommand),
    /// Fold positively-rated feedback into the knowledge base
    Retrain(KbRetrainCommand),
    /// Run a similarity search and print the scored candidates
    Search(KbSearchCommand),
}

/// Ingest worked problems
#[derive(Args, Debug)]
pub struct KbIngestCommand {
    /// JSON file with an array of {id, question, steps, final_answer}
    #[arg(short, long)]
    pub file: PathBuf,
}

impl KbIngestCommand {
    pub async fn execute(&self, config: &AgentConfig) -> AgentResult<()> {
        tracing::info!("Executing kb ingest command for {:?}", self.file);

        let api_key = config.require_google_api_key()?;
        let embedder = GeminiEmbedder::new(api_key, &config.embed_model);
        let kb = super::build_knowledge_base(config)?;

        let records = ingest::load_records(&self.file)?;
        let written = ingest::ingest(&kb, &embedder, &records).await?;

        println!(
            "Ingested {} records into collection '{}'",
            written, config.collection
        );

        Ok(())
    }
}

/// Retrain from positive feedback
#[derive(Args, Debug)]
pub struct KbRetrainCommand {}

impl KbRetrainCommand {
    pub async fn execute(&self, config: &AgentConfig) -> AgentResult<()> {
        tracing::info!("Executing kb retrain command");

        let log = FeedbackLog::new(&config.feedback_log, config.retrain_trigger_count);
        let pairs = log.positive_pairs()?;

        if pairs.is_empty() {
            println!("No positive feedback with answers to retrain from");
            return Ok(());
        }

        let api_key = config.require_google_api_key()?;
        let embedder = GeminiEmbedder::new(api_key, &config.embed_model);
        let kb = super::build_knowledge_base(config)?;

        let written = ingest::retrain_from_pairs(&kb, &embedder, &pairs).await?;

        println!(
            "Retrained: {} feedback-derived records written to '{}'",
            written, config.collection
        );

        Ok(())
    }
}

/// Inspect similarity search results
#[derive(Args, Debug)]
pub struct KbSearchCommand {
    /// Query text
    pub query: String,

    /// Number of candidates to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

impl KbSearchCommand {
    pub async fn execute(&self, config: &AgentConfig) -> AgentResult<()> {
        tracing::info!("Executing kb search command");

        let kb = super::build_knowledge_base(config)?;
        let top_k = self.top_k.unwrap_or(config.kb_top_k);

        let hits = kb.search(&self.query, top_k).await?;

        if hits.is_empty() {
            println!("No candidates found");
            return Ok(());
        }

        for hit in &hits {
            let marker = if hit.score >= config.kb_threshold {
                "hit"
            } else {
                "below threshold"
            };
            println!("[{}] score {:.3} ({})", hit.id, hit.score, marker);
            println!("  Q: {}", hit.payload.question);
            if !hit.payload.final_answer.is_empty() {
                println!("  A: {}", hit.payload.final_answer);
            }
        }

        Ok(())
    }
}

impl KbCommand {
    /// Execute the selected knowledge base action.
    pub async fn execute(&self, config: &AgentConfig) -> AgentResult<()> {
        match &self.action {
            KbAction::Ingest(cmd) => cmd.execute(config).await,
            KbAction::Retrain(cmd) => cmd.execute(config).await,
            KbAction::Search(cmd) => cmd.execute(config).await,
        }
    }
}
