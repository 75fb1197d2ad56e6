//! LLM provider factory.
//!
//! Resolves a provider name plus connection options into a shared client.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::{ClientOptions, ProviderType};
use docchat_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Errors
/// Returns error if the provider is unknown, a required API key is
/// missing, or the HTTP client cannot be built.
pub fn create_client(provider: &str, options: &ClientOptions) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    match provider_type {
        ProviderType::Ollama => {
            let base_url = options
                .endpoint
                .as_deref()
                .unwrap_or(OllamaClient::DEFAULT_BASE_URL);
            Ok(Arc::new(OllamaClient::with_base_url(base_url, options.timeout)?))
        }
        ProviderType::OpenAI => {
            let api_key = options
                .api_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| AppError::Config("OpenAI provider requires API key".to_string()))?;
            let base_url = options
                .endpoint
                .as_deref()
                .unwrap_or(OpenAiClient::DEFAULT_BASE_URL);
            Ok(Arc::new(OpenAiClient::new(base_url, api_key, options.timeout)?))
        }
    }
}
