//! Matha Core Library
//!
//! Foundational utilities for the Matha math agent:
//! - Error handling (`AgentError`, `AgentResult`)
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
