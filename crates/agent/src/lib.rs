//! Matha answer pipeline.
//!
//! The core of the agent: guardrails, result parsing, prompt construction,
//! and the answer orchestrator, plus the feedback log and the offline
//! evaluation harness. External capabilities (retrieval, generation, web
//! search) are injected behind traits.

pub mod ask;
pub mod eval;
pub mod feedback;
pub mod guardrails;
pub mod parser;
pub mod prompts;
pub mod types;

// Re-export main types
pub use ask::MathAgent;
pub use feedback::{FeedbackEntry, FeedbackEvent, FeedbackLog};
pub use guardrails::{ContentPolicy, KeywordPolicy};
pub use parser::{extract_final_answer, parse, ParsedGeneration};
pub use types::{AskRequest, AskResponse, ExplainLevel};
