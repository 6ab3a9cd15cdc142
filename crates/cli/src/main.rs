//! Matha CLI
//!
//! Command-line surface for the math routing agent: ask questions against
//! the worked-problem knowledge base, record feedback, maintain the
//! knowledge base, and run offline evaluations.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, EvalCommand, FeedbackCommand, KbCommand};
use matha_core::{config::AgentConfig, logging, AgentResult};
use std::path::PathBuf;

/// Matha - retrieval-augmented math question answering
#[derive(Parser, Debug)]
#[command(name = "matha")]
#[command(about = "Retrieval-augmented math question answering", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, global = true, env = "MATHA_CONFIG")]
    config: Option<PathBuf>,

    /// Similarity threshold for the retrieval-hit path
    #[arg(long, global = true, env = "KB_THRESHOLD")]
    threshold: Option<f32>,

    /// Number of candidates per retrieval
    #[arg(long, global = true, env = "KB_TOPK")]
    top_k: Option<usize>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a math question
    Ask(AskCommand),

    /// Record feedback on an answer
    Feedback(FeedbackCommand),

    /// Knowledge base maintenance (ingest, retrain, search)
    Kb(KbCommand),

    /// Evaluate the agent against a benchmark dataset
    Eval(EvalCommand),
}

#[tokio::main]
async fn main() -> AgentResult<()> {
    let cli = Cli::parse();

    // Environment first, then CLI overrides
    let mut config = AgentConfig::load()?;

    // A --config flag names a file load() has not merged yet
    if let Some(ref path) = cli.config {
        if config.config_file.as_ref() != Some(path) {
            config = config.merge_config_file(path)?;
        }
    }

    let config = config.with_overrides(
        cli.config,
        cli.threshold,
        cli.top_k,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    config.validate()?;

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Matha CLI starting");
    tracing::debug!("Qdrant: {} / {}", config.qdrant_url, config.collection);
    tracing::debug!(
        "Threshold: {:.2}, top-K: {}",
        config.kb_threshold,
        config.kb_top_k
    );

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Feedback(_) => "feedback",
        Commands::Kb(_) => "kb",
        Commands::Eval(_) => "eval",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Feedback(cmd) => cmd.execute(&config),
        Commands::Kb(cmd) => cmd.execute(&config).await,
        Commands::Eval(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        // Catches duplicate flag names and other definition conflicts,
        // which clap otherwise only asserts at parse time.
        Cli::command().debug_assert();
    }

    #[test]
    fn test_feedback_comment_has_no_short_flag() {
        // The -c short belongs to the global --config flag.
        let cli = Cli::try_parse_from([
            "matha", "feedback", "--user", "u1", "--question", "Solve x = 1", "--rating", "5",
            "--comment", "x = 1",
        ])
        .unwrap();

        match cli.command {
            Commands::Feedback(cmd) => {
                assert_eq!(cmd.comment.as_deref(), Some("x = 1"));
                assert_eq!(cmd.rating, 5);
            }
            _ => panic!("expected the feedback command"),
        }
    }
}
