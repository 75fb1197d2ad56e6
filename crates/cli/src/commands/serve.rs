//! Serve command handler.

use crate::server;
use clap::Args;
use docchat_core::{config::AppConfig, AppResult};
use std::path::PathBuf;
use std::sync::Arc;

/// Start the HTTP chat server
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on (default: server.bind)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Dataset to answer from (default: chat.dataset)
    #[arg(short, long)]
    pub dataset: Option<String>,

    /// Directory of static assets served as a fallback
    #[arg(long)]
    pub static_dir: Option<PathBuf>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let mut config = config.clone();
        if let Some(ref bind) = self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(ref dataset) = self.dataset {
            config.chat.dataset = dataset.clone();
        }
        if let Some(ref dir) = self.static_dir {
            config.server.static_dir = Some(dir.clone());
        }

        let engine = super::build_engine(&config).await?;
        tracing::info!(
            "Index for '{}' ready with {} entries",
            config.chat.dataset,
            engine.index().len()
        );

        let state = Arc::new(server::AppState {
            engine,
            dataset: config.chat.dataset.clone(),
        });
        server::serve(state, &config.server).await
    }
}
