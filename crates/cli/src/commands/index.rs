//! Index command handler.

use clap::Args;
use docchat_core::{config::AppConfig, AppResult};

/// Load or build the dataset index and print its statistics
#[derive(Args, Debug)]
pub struct IndexCommand {
    /// Dataset to index (default: chat.dataset)
    #[arg(short, long)]
    pub dataset: Option<String>,

    /// Discard the persisted index and embed everything again
    #[arg(long)]
    pub rebuild: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let mut config = config.clone();
        if let Some(ref dataset) = self.dataset {
            config.chat.dataset = dataset.clone();
        }
        tracing::info!("Executing index command for dataset '{}'", config.chat.dataset);

        let (index, _) = super::open_index(&config, self.rebuild).await?;
        let stats = index.stats();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Dataset: {}", stats.dataset);
            println!("  Entries: {}", stats.entries);
            println!("  Sources: {}", stats.sources);
            println!(
                "  Embeddings: {}/{} ({} dims)",
                stats.embedding_provider, stats.embedding_model, stats.dimensions
            );
            println!("  Built at: {}", stats.built_at);
        }

        Ok(())
    }
}
