//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{ollama::OllamaProvider, openai::OpenAiProvider, trigram::TrigramProvider};
use docchat_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "openai", "ollama", "trigram")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
pub fn create_provider(
    config: &EmbeddingConfig,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    config.validate()?;

    match config.provider.as_str() {
        "trigram" | "mock" => Ok(Arc::new(TrigramProvider::new(config.dimensions))),

        "openai" => {
            let api_key = config.resolve_api_key(api_key).ok_or_else(|| {
                AppError::Config(
                    "OpenAI embeddings require an API key (set OPENAI_API_KEY or embedding.api_key_env)"
                        .to_string(),
                )
            })?;
            let endpoint = config
                .endpoint
                .as_deref()
                .unwrap_or(OpenAiProvider::DEFAULT_BASE_URL);
            Ok(Arc::new(OpenAiProvider::new(
                endpoint,
                &api_key,
                &config.model,
                config.dimensions,
                config.timeout(),
            )?))
        }

        "ollama" => {
            let endpoint = config
                .endpoint
                .as_deref()
                .unwrap_or(OllamaProvider::DEFAULT_BASE_URL);
            Ok(Arc::new(OllamaProvider::new(
                endpoint,
                &config.model,
                config.dimensions,
                config.timeout(),
            )?))
        }

        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'",
            other
        ))),
    }
}
