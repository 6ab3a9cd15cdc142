//! Feedback log with an explicit retrain trigger.
//!
//! Feedback is an append-only JSONL side effect, invoked separately from
//! the ask path. Recording returns an event: every time the number of
//! positive entries (rating >= 4) reaches a multiple of the trigger count,
//! `RetrainDue` tells the caller that a retraining pass is worthwhile. The
//! log itself never spawns anything.

use chrono::{DateTime, Utc};
use matha_core::{AgentError, AgentResult};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

/// Ratings at or above this count as positive.
pub const POSITIVE_RATING: u8 = 4;

/// One feedback record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    /// Who gave the feedback
    pub user_id: String,

    /// The question the feedback refers to
    pub question: String,

    /// Optional free-text comment (for positive entries, typically the
    /// corrected or confirmed answer)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Rating 1-5
    pub rating: u8,

    /// When the feedback was recorded
    pub timestamp: DateTime<Utc>,
}

impl FeedbackEntry {
    /// Create an entry stamped with the current time.
    pub fn new(
        user_id: impl Into<String>,
        question: impl Into<String>,
        rating: u8,
        comment: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            question: question.into(),
            comment,
            rating,
            timestamp: Utc::now(),
        }
    }

    /// True when this entry counts toward the retrain trigger.
    pub fn is_positive(&self) -> bool {
        self.rating >= POSITIVE_RATING
    }
}

/// Outcome of recording one feedback entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackEvent {
    /// Recorded, nothing else to do
    Recorded,

    /// Recorded, and enough positive feedback has accumulated that a
    /// retraining pass is due
    RetrainDue { positive_count: usize },
}

/// Append-only JSONL feedback log.
pub struct FeedbackLog {
    path: PathBuf,
    trigger_every: usize,
}

impl FeedbackLog {
    /// Open a log at the given path. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>, trigger_every: usize) -> Self {
        Self {
            path: path.into(),
            trigger_every,
        }
    }

    /// Append an entry and report whether retraining is due.
    pub fn record(&self, entry: &FeedbackEntry) -> AgentResult<FeedbackEvent> {
        if !(1..=5).contains(&entry.rating) {
            return Err(AgentError::Config(format!(
                "Rating must be 1-5, got {}",
                entry.rating
            )));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let line = serde_json::to_string(entry)?;
        writeln!(file, "{}", line)?;

        tracing::info!("Feedback recorded for user {}", entry.user_id);

        if entry.is_positive() {
            let positive_count = self.positive_count()?;
            if positive_count > 0 && positive_count % self.trigger_every == 0 {
                tracing::info!(
                    "{} positive feedback entries accumulated, retraining due",
                    positive_count
                );
                return Ok(FeedbackEvent::RetrainDue { positive_count });
            }
        }

        Ok(FeedbackEvent::Recorded)
    }

    /// Read all entries, skipping malformed lines with a warning.
    pub fn entries(&self) -> AgentResult<Vec<FeedbackEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = std::fs::File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<FeedbackEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!("Skipping malformed feedback line: {}", e),
            }
        }

        Ok(entries)
    }

    /// Count positive entries in the log.
    pub fn positive_count(&self) -> AgentResult<usize> {
        Ok(self
            .entries()?
            .iter()
            .filter(|entry| entry.is_positive())
            .count())
    }

    /// Question/comment pairs from positive entries, for retraining.
    ///
    /// Entries without a comment carry no answer to learn from and are
    /// skipped.
    pub fn positive_pairs(&self) -> AgentResult<Vec<(String, String)>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|entry| entry.is_positive())
            .filter_map(|entry| {
                entry
                    .comment
                    .filter(|comment| !comment.trim().is_empty())
                    .map(|comment| (entry.question, comment))
            })
            .collect())
    }
}
