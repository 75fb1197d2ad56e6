//! Ask command handler.
//!
//! Runs one question through the full pipeline: retrieval, draft,
//! link validation and correction.

use clap::Args;
use docchat_core::{config::AppConfig, AppResult};

/// Ask a single question against the dataset
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Dataset to answer from (default: chat.dataset)
    #[arg(short, long)]
    pub dataset: Option<String>,

    /// Conversation the question belongs to
    #[arg(short, long, default_value = "default")]
    pub session: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let mut config = config.clone();
        if let Some(ref dataset) = self.dataset {
            config.chat.dataset = dataset.clone();
        }
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let engine = super::build_engine(&config).await?;
        let answer = engine.ask(&self.session, &self.question).await?;

        if self.json {
            let output = serde_json::json!({
                "answer": answer.answer,
                "model": config.model,
                "provider": config.provider,
                "sources": answer.sources,
                "validatedLinks": answer.validated_links,
                "removedLinks": answer.removed_links,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", answer.answer);

            if tracing::enabled!(tracing::Level::DEBUG) {
                tracing::debug!("Sources: {}", answer.sources.join(", "));
                if !answer.removed_links.is_empty() {
                    tracing::debug!("Removed links: {}", answer.removed_links.join(", "));
                }
            }
        }

        Ok(())
    }
}
