//! Feedback command handler.
//!
//! Appends a rating to the feedback log and surfaces the retrain hint when
//! enough positive feedback has accumulated.

use clap::Args;
use matha_agent::{FeedbackEntry, FeedbackEvent, FeedbackLog};
use matha_core::{AgentConfig, AgentResult};

/// Record feedback on an answer
#[derive(Args, Debug)]
pub struct FeedbackCommand {
    /// User identifier
    #[arg(short, long)]
    pub user: String,

    /// The question the feedback refers to
    #[arg(short, long)]
    pub question: String,

    /// Rating 1-5 (4 or 5 counts as positive)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub rating: u8,

    /// Free-text comment; for positive ratings this should hold the
    /// confirmed answer so retraining can reuse it
    #[arg(long)]
    pub comment: Option<String>,
}

impl FeedbackCommand {
    /// Execute the feedback command.
    pub fn execute(&self, config: &AgentConfig) -> AgentResult<()> {
        tracing::info!("Executing feedback command");

        let log = FeedbackLog::new(&config.feedback_log, config.retrain_trigger_count);
        let entry = FeedbackEntry::new(&self.user, &self.question, self.rating, self.comment.clone());

        match log.record(&entry)? {
            FeedbackEvent::Recorded => {
                println!("Feedback recorded");
            }
            FeedbackEvent::RetrainDue { positive_count } => {
                println!(
                    "Feedback recorded ({} positive entries). Retraining is due: run 'matha kb retrain'",
                    positive_count
                );
            }
        }

        Ok(())
    }
}
