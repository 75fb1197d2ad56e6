//! Persisted vector index: build once, load many times.
//!
//! [`IndexBuilder::load_or_build`] returns the on-disk index when it is
//! present and was built with the configured embedder. Otherwise it scans,
//! chunks and embeds the dataset, persists the result and returns it. Builds
//! for one dataset are serialized by a process-wide async lock, and callers
//! that waited on the lock reuse the index the first builder wrote.

pub mod store;

use crate::chunk::{ChunkPipeline, ContentBucket};
use crate::config::get_index_path;
use crate::embeddings::EmbeddingProvider;
use crate::ingest::{filter_by_extension, load_documents};
use crate::progress::ProgressReporter;
use crate::scan::enumerate_files;
use crate::types::{IndexStats, KnowledgeBaseConfig};
use chrono::{DateTime, Utc};
use docchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};
use std::time::Instant;

/// Bumped whenever the on-disk layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// One embedded chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub source: String,
    pub position: u32,
    pub bucket: ContentBucket,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// How and when an index was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub dataset: String,
    pub embedding_provider: String,
    pub embedding_model: String,
    pub dimensions: usize,
    pub entry_count: usize,
    pub built_at: DateTime<Utc>,
}

/// An in-memory, read-only vector index.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    manifest: IndexManifest,
    entries: Vec<IndexEntry>,
}

impl DocumentIndex {
    pub fn new(manifest: IndexManifest, entries: Vec<IndexEntry>) -> Self {
        Self { manifest, entries }
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-k entries by cosine similarity, best first. Ties keep index order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<(&IndexEntry, f32)> {
        let mut scored: Vec<(&IndexEntry, f32)> = self
            .entries
            .iter()
            .map(|entry| (entry, cosine_similarity(query, &entry.embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);
        scored
    }

    pub fn stats(&self) -> IndexStats {
        let sources: HashSet<&str> = self.entries.iter().map(|e| e.source.as_str()).collect();
        IndexStats {
            dataset: self.manifest.dataset.clone(),
            entries: self.entries.len(),
            sources: sources.len(),
            embedding_provider: self.manifest.embedding_provider.clone(),
            embedding_model: self.manifest.embedding_model.clone(),
            dimensions: self.manifest.dimensions,
            built_at: self.manifest.built_at,
        }
    }
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot_product / (norm_a * norm_b);
    // NaN or inf components from a remote embedder score as unrelated
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

static BUILD_LOCKS: LazyLock<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn build_lock(dataset: &str) -> Arc<tokio::sync::Mutex<()>> {
    let mut locks = BUILD_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(dataset.to_string()).or_default())
}

/// Loads a dataset's persisted index, building it when needed.
pub struct IndexBuilder {
    workspace: PathBuf,
    config: KnowledgeBaseConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    progress: ProgressReporter,
}

impl IndexBuilder {
    pub fn new(
        workspace: &Path,
        config: KnowledgeBaseConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            workspace: workspace.to_path_buf(),
            config,
            embedder,
            progress: ProgressReporter::noop(),
        })
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn index_path(&self) -> PathBuf {
        get_index_path(&self.workspace, &self.config.name)
    }

    /// Load the persisted index if it exists and is usable.
    ///
    /// Missing, unreadable and incompatible indexes all yield `None`.
    pub fn try_load(&self) -> Option<DocumentIndex> {
        let path = self.index_path();
        if !path.exists() {
            tracing::debug!("No index at {:?}", path);
            return None;
        }

        let (manifest, entries) = match store::read_index(&path) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!("Ignoring unreadable index at {:?}: {}", path, e);
                return None;
            }
        };

        if let Err(reason) = self.check_compatible(&manifest, entries.len()) {
            tracing::warn!("Ignoring incompatible index at {:?}: {}", path, reason);
            return None;
        }

        tracing::info!(
            "Loaded index for '{}' ({} entries, built {})",
            manifest.dataset,
            entries.len(),
            manifest.built_at.to_rfc3339()
        );
        Some(DocumentIndex::new(manifest, entries))
    }

    fn check_compatible(&self, manifest: &IndexManifest, rows: usize) -> Result<(), String> {
        if manifest.format_version != FORMAT_VERSION {
            return Err(format!(
                "format version {} (expected {})",
                manifest.format_version, FORMAT_VERSION
            ));
        }
        if manifest.entry_count != rows {
            return Err(format!(
                "meta records {} entries but {} are stored",
                manifest.entry_count, rows
            ));
        }
        if manifest.embedding_provider != self.embedder.provider_name()
            || manifest.embedding_model != self.embedder.model_name()
            || manifest.dimensions != self.embedder.dimensions()
        {
            return Err(format!(
                "built with {}/{} ({} dims), configured {}/{} ({} dims)",
                manifest.embedding_provider,
                manifest.embedding_model,
                manifest.dimensions,
                self.embedder.provider_name(),
                self.embedder.model_name(),
                self.embedder.dimensions()
            ));
        }
        Ok(())
    }

    /// Return the persisted index, or build and persist a fresh one.
    pub async fn load_or_build(&self) -> AppResult<DocumentIndex> {
        if let Some(index) = self.try_load() {
            return Ok(index);
        }

        let lock = build_lock(&self.config.name);
        let _guard = lock.lock().await;

        // Another caller may have finished a build while we waited
        if let Some(index) = self.try_load() {
            return Ok(index);
        }

        self.build().await
    }

    /// Delete the persisted index and build from scratch.
    pub async fn rebuild(&self) -> AppResult<DocumentIndex> {
        let lock = build_lock(&self.config.name);
        let _guard = lock.lock().await;

        let path = self.index_path();
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| {
                AppError::Knowledge(format!("Failed to delete index at {:?}: {}", path, e))
            })?;
            tracing::info!("Deleted index at {:?}", path);
        }

        self.build().await
    }

    #[tracing::instrument(skip(self), fields(dataset = %self.config.name))]
    async fn build(&self) -> AppResult<DocumentIndex> {
        let start = Instant::now();
        let dataset_root = self.config.dataset_root(&self.workspace);

        tracing::warn!(
            "Building index for '{}' with {}/{}: embedding will incur paid API calls",
            self.config.name,
            self.embedder.provider_name(),
            self.embedder.model_name()
        );

        let files = enumerate_files(&dataset_root)?;
        self.progress.scan(files.len(), &dataset_root.display().to_string());

        let files = filter_by_extension(files, &self.config.allowed_extensions);
        let documents = load_documents(&files, &self.config.datasets_root(&self.workspace))?;
        self.progress.load(documents.len());

        let chunks = ChunkPipeline::new(self.config.chunk_profiles()).process(&documents)?;
        self.progress.chunk(documents.len(), chunks.len());

        let dimensions = self.embedder.dimensions();
        let batch_size = self.config.embedding.batch_size.max(1);
        let mut entries = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;

            if vectors.len() != batch.len() {
                return Err(AppError::Embedding(format!(
                    "Embedder returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }

            for (chunk, embedding) in batch.iter().zip(vectors) {
                if embedding.len() != dimensions {
                    return Err(AppError::Embedding(format!(
                        "Embedding has {} dimensions, expected {}",
                        embedding.len(),
                        dimensions
                    )));
                }
                entries.push(IndexEntry {
                    id: format!("{}#{}", chunk.metadata.source, chunk.metadata.position),
                    source: chunk.metadata.source.clone(),
                    position: chunk.metadata.position,
                    bucket: chunk.metadata.bucket,
                    text: chunk.text.clone(),
                    embedding,
                });
            }

            self.progress
                .embed(entries.len(), chunks.len(), self.embedder.model_name());
        }

        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            dataset: self.config.name.clone(),
            embedding_provider: self.embedder.provider_name().to_string(),
            embedding_model: self.embedder.model_name().to_string(),
            dimensions,
            entry_count: entries.len(),
            built_at: Utc::now(),
        };

        let path = self.index_path();
        store::write_index(&path, &manifest, &entries)?;
        self.progress
            .persist(entries.len(), &path.display().to_string());

        tracing::info!(
            "Built index for '{}': {} documents, {} entries in {:.2}s",
            self.config.name,
            documents.len(),
            entries.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(DocumentIndex::new(manifest, entries))
    }
}
