//! Language model integration for docchat.
//!
//! A provider-agnostic `LlmClient` trait plus the providers the answer
//! pipeline can talk to.
//!
//! # Providers
//! - **OpenAI**: any OpenAI-compatible `/chat/completions` endpoint (default)
//! - **Ollama**: local LLM runtime
//!
//! Calls are never retried. Every client carries a request timeout, and a
//! failed or timed out call surfaces immediately as `AppError::Llm`.
//!
//! # Example
//! ```no_run
//! use std::time::Duration;
//! use docchat_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::with_base_url("http://localhost:11434", Duration::from_secs(30))?;
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiClient};
pub use types::{ClientOptions, ProviderType};
