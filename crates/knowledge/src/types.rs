//! Knowledge system type definitions.

use crate::chunk::{ChunkConfig, ChunkProfiles, ContentBucket};
use crate::embeddings::EmbeddingConfig;
use chrono::{DateTime, Utc};
use docchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Configuration for one dataset's knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Dataset name
    #[serde(default)]
    pub name: String,

    /// Directory holding one subdirectory per dataset, relative to the workspace
    #[serde(default = "default_datasets_dir")]
    pub datasets_dir: PathBuf,

    /// File suffixes that are ingested (case-sensitive)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Per-bucket overrides of chunk size and overlap
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<ContentBucket, ChunkConfig>,

    /// Embedding settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_datasets_dir() -> PathBuf {
    PathBuf::from("datasets")
}

fn default_allowed_extensions() -> Vec<String> {
    [".md", ".mdx", ".ts", ".tsx", ".js", ".jsx", ".html", ".css", ".json"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    20
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            datasets_dir: default_datasets_dir(),
            allowed_extensions: default_allowed_extensions(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            profiles: BTreeMap::new(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl KnowledgeBaseConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Directory holding every dataset.
    pub fn datasets_root(&self, workspace: &Path) -> PathBuf {
        if self.datasets_dir.is_absolute() {
            self.datasets_dir.clone()
        } else {
            workspace.join(&self.datasets_dir)
        }
    }

    /// Root directory of this dataset's source files.
    pub fn dataset_root(&self, workspace: &Path) -> PathBuf {
        self.datasets_root(workspace).join(&self.name)
    }

    pub fn chunk_profiles(&self) -> ChunkProfiles {
        let default = ChunkConfig {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        };
        self.profiles
            .iter()
            .fold(ChunkProfiles::uniform(default), |profiles, (bucket, cfg)| {
                profiles.with_override(*bucket, *cfg)
            })
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Config("Dataset name cannot be empty".to_string()));
        }
        if self.name.contains(['/', '\\']) || self.name == ".." {
            return Err(AppError::Config(format!(
                "Invalid dataset name: '{}'",
                self.name
            )));
        }
        if self.allowed_extensions.is_empty() {
            return Err(AppError::Config(
                "allowed_extensions cannot be empty".to_string(),
            ));
        }

        ChunkConfig {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        }
        .validate()?;
        for cfg in self.profiles.values() {
            cfg.validate()?;
        }

        self.embedding.validate()
    }
}

/// A file read from the datasets tree.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Absolute path on disk
    pub path: PathBuf,

    /// Path relative to the datasets root, '/'-separated
    pub source: String,

    /// Full UTF-8 content
    pub content: String,
}

/// Statistics for a built index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub dataset: String,
    pub entries: usize,
    pub sources: usize,
    pub embedding_provider: String,
    pub embedding_model: String,
    pub dimensions: usize,
    pub built_at: DateTime<Utc>,
}
