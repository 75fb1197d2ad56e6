//! Knowledge base configuration management.

use crate::types::KnowledgeBaseConfig;
use docchat_core::config::STATE_DIR;
use docchat_core::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Load a dataset's knowledge configuration.
///
/// Loads from `.docchat/knowledge/<dataset>/config.yaml` if it exists,
/// otherwise returns the defaults for that dataset name.
pub fn load_config(workspace: &Path, dataset: &str) -> AppResult<KnowledgeBaseConfig> {
    let config_path = get_config_path(workspace, dataset);

    if config_path.exists() {
        let content = fs::read_to_string(&config_path).map_err(|e| {
            AppError::Knowledge(format!("Failed to read config at {:?}: {}", config_path, e))
        })?;

        let mut config: KnowledgeBaseConfig = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Knowledge(format!("Failed to parse config at {:?}: {}", config_path, e))
        })?;

        // Ensure name matches
        config.name = dataset.to_string();

        tracing::debug!("Loaded knowledge config for dataset '{}'", dataset);
        Ok(config)
    } else {
        tracing::debug!(
            "Using default knowledge config for dataset '{}' (no config file found)",
            dataset
        );
        Ok(KnowledgeBaseConfig::new(dataset))
    }
}

/// Save a dataset's knowledge configuration.
pub fn save_config(workspace: &Path, config: &KnowledgeBaseConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace, &config.name);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Knowledge(format!("Failed to create config directory: {}", e))
        })?;
    }

    let yaml = serde_yaml::to_string(config)?;
    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Knowledge(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved knowledge config for dataset '{}'", config.name);
    Ok(())
}

/// Get the path to a dataset's config file.
pub fn get_config_path(workspace: &Path, dataset: &str) -> PathBuf {
    workspace
        .join(STATE_DIR)
        .join("knowledge")
        .join(dataset)
        .join("config.yaml")
}

/// Get the directory holding a dataset's persisted index.
pub fn get_embeddings_dir(workspace: &Path, dataset: &str) -> PathBuf {
    workspace.join(STATE_DIR).join("embeddings").join(dataset)
}

/// Get the SQLite index path for a dataset.
pub fn get_index_path(workspace: &Path, dataset: &str) -> PathBuf {
    get_embeddings_dir(workspace, dataset).join("index.sqlite")
}
