//! LLM integration crate for the Matha agent.
//!
//! Provides a provider-agnostic abstraction for text generation. The
//! orchestrator sees only the `Generator` trait; the concrete provider is
//! Gemini's Generative Language API.
//!
//! # Example
//! ```no_run
//! use matha_llm::{GenerateRequest, Generator, GeminiClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GeminiClient::new("api-key");
//! let request = GenerateRequest::new("Differentiate x^3", "gemini-2.5-flash");
//! let response = client.generate(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod providers;
pub mod sanitize;

// Re-export main types
pub use client::{GenerateRequest, GenerateResponse, GenerateUsage, Generator};
pub use providers::GeminiClient;
pub use sanitize::strip_filler;
