//! Eval command handler.
//!
//! Runs the offline benchmark: each dataset question is asked in
//! single-answer mode and scored against the expected answer.

use clap::Args;
use matha_agent::eval::{evaluate, load_dataset, write_report};
use matha_core::{AgentConfig, AgentResult};
use matha_llm::GeminiClient;
use std::path::PathBuf;

/// Evaluate against a benchmark dataset
#[derive(Args, Debug)]
pub struct EvalCommand {
    /// JSON file with an array of {question, answer}
    #[arg(short, long)]
    pub dataset: PathBuf,

    /// Maximum number of items to evaluate
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Write the full report to this path as JSON
    #[arg(short, long)]
    pub report: Option<PathBuf>,
}

impl EvalCommand {
    /// Execute the eval command.
    pub async fn execute(&self, config: &AgentConfig) -> AgentResult<()> {
        tracing::info!("Executing eval command on {:?}", self.dataset);

        let api_key = config.require_google_api_key()?;
        let generator = GeminiClient::new(api_key);

        let items = load_dataset(&self.dataset)?;
        let report = evaluate(&generator, &config.gen_model, &items, self.limit).await?;

        println!(
            "Accuracy: {:.1}% ({}/{} correct, avg latency {:.0} ms)",
            report.accuracy * 100.0,
            report.correct,
            report.total,
            report.avg_latency_ms
        );

        if let Some(ref path) = self.report {
            write_report(path, &report)?;
            println!("Report written to {:?}", path);
        }

        Ok(())
    }
}
