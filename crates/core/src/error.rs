//! Error types for the Matha agent.
//!
//! One unified enum covers the whole request taxonomy: user-facing
//! rejections (empty input, off-domain, unsafe output), collaborator
//! failures (retrieval, generation), and ambient concerns (config, I/O,
//! serialization).

use thiserror::Error;

/// Unified error type for the Matha agent.
///
/// All fallible functions in the workspace return `Result<T, AgentError>`.
/// We never panic; errors must be represented and propagated.
///
/// A degenerate generation (no steps, no final answer) is intentionally NOT
/// an error: the parser absorbs it and the response comes back with empty
/// fields, since a partial answer is still informative to the caller.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The question was empty or whitespace-only
    #[error("Question is empty")]
    EmptyInput,

    /// The input guardrail rejected the question
    #[error("Only math questions are allowed")]
    OffDomain,

    /// The output guardrail rejected the generated answer
    #[error("Unsafe output detected")]
    UnsafeOutput,

    /// The retrieval collaborator failed
    #[error("Retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// The generation collaborator failed
    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// True for user-facing rejections (the 4xx-equivalents).
    ///
    /// Collaborator failures and ambient errors are service-side
    /// (5xx-equivalent) and return false.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AgentError::EmptyInput | AgentError::OffDomain | AgentError::UnsafeOutput
        )
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AgentError {
    fn from(err: serde_yaml::Error) -> Self {
        AgentError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AgentError.
pub type AgentResult<T> = Result<T, AgentError>;
