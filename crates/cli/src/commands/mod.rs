//! Command handlers for the docchat CLI.

pub mod ask;
pub mod index;
pub mod serve;

pub use ask::AskCommand;
pub use index::IndexCommand;
pub use serve::ServeCommand;

use docchat_core::{config::AppConfig, AppResult};
use docchat_knowledge::{
    create_provider, load_config, ChatEngine, DocumentIndex, EmbeddingProvider, HttpProbe,
    IndexBuilder, ProgressEvent, ProgressReporter,
};
use docchat_llm::{create_client, ClientOptions};
use std::sync::Arc;

/// Load the configured dataset's index, building it when needed.
pub async fn open_index(
    config: &AppConfig,
    rebuild: bool,
) -> AppResult<(DocumentIndex, Arc<dyn EmbeddingProvider>)> {
    let dataset = &config.chat.dataset;
    let kb_config = load_config(&config.workspace, dataset)?;
    let embedder = create_provider(&kb_config.embedding, config.api_key.as_deref())?;

    let progress = ProgressReporter::new(Arc::new(|event: ProgressEvent| {
        tracing::debug!("{}", event.format_simple());
    }));
    let builder = IndexBuilder::new(&config.workspace, kb_config, Arc::clone(&embedder))?
        .with_progress(progress);

    let index = if rebuild {
        builder.rebuild().await?
    } else {
        builder.load_or_build().await?
    };

    Ok((index, embedder))
}

/// Assemble the full question pipeline for the configured dataset.
pub async fn build_engine(config: &AppConfig) -> AppResult<ChatEngine> {
    let (index, embedder) = open_index(config, false).await?;

    let options = ClientOptions {
        endpoint: config.provider_endpoint(&config.provider),
        api_key: config.resolve_api_key(&config.provider),
        timeout: config.request_timeout(),
    };
    let llm = create_client(&config.provider, &options)?;
    let probe = Arc::new(HttpProbe::new(config.chat.probe_timeout())?);

    ChatEngine::new(
        &config.workspace,
        Arc::new(index),
        embedder,
        llm,
        &config.model,
        probe,
        &config.chat,
    )
}
