//! Ask command handler.
//!
//! Wires the full answer pipeline together: Qdrant retrieval, Gemini
//! generation, Serper web-search fallback, and the keyword guardrails.

use clap::Args;
use matha_agent::{AskRequest, ExplainLevel, KeywordPolicy, MathAgent};
use matha_core::{AgentConfig, AgentError, AgentResult};
use matha_llm::GeminiClient;
use matha_retrieval::SerperClient;
use std::sync::Arc;

/// Ask a math question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Explanation detail ("simple" or "detailed")
    #[arg(short, long, default_value = "detailed")]
    pub level: String,

    /// User identifier attached to the request
    #[arg(short, long)]
    pub user: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AgentConfig) -> AgentResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let level = ExplainLevel::parse(&self.level).ok_or_else(|| {
            AgentError::Config(format!(
                "Unknown explanation level '{}' (expected 'simple' or 'detailed')",
                self.level
            ))
        })?;

        let api_key = config.require_google_api_key()?;

        let kb = super::build_knowledge_base(config)?;
        let generator = GeminiClient::new(api_key);
        let web_search = SerperClient::new(config.serper_api_key.clone());

        let agent = MathAgent::new(
            config.clone(),
            Arc::new(kb),
            Arc::new(generator),
            Arc::new(web_search),
            Box::new(KeywordPolicy::new()),
        );

        let mut request = AskRequest::new(&self.question).with_level(level);
        if let Some(ref user) = self.user {
            request = request.with_user(user);
        }

        let response = agent.ask(&request).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            for (i, step) in response.steps.iter().enumerate() {
                println!("{}. {}", i + 1, step);
            }
            if !response.final_answer.is_empty() {
                println!();
                println!("Final answer: {}", response.final_answer);
            }
            if !response.sources.is_empty() {
                println!("Sources: {}", response.sources.join(", "));
            }
            println!("Confidence: {:.3}", response.confidence);
        }

        Ok(())
    }
}
