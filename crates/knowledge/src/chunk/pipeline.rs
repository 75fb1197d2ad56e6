//! Chunking pipeline orchestrator.

use super::{
    classify,
    splitters::{ChunkSplitter, CodeSplitter, MarkdownSplitter, TextSplitter},
    Chunk, ContentBucket, ScriptLanguage,
};
use crate::types::SourceDocument;
use docchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Size settings for one bucket, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChunkConfig {
    /// Target (and maximum) chunk size
    pub chunk_size: usize,

    /// Overlap between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 20,
        }
    }
}

impl ChunkConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be greater than 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Per-bucket chunk settings. Buckets without an override use the default.
#[derive(Debug, Clone, Default)]
pub struct ChunkProfiles {
    default: ChunkConfig,
    overrides: BTreeMap<ContentBucket, ChunkConfig>,
}

impl ChunkProfiles {
    pub fn uniform(config: ChunkConfig) -> Self {
        Self {
            default: config,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, bucket: ContentBucket, config: ChunkConfig) -> Self {
        self.overrides.insert(bucket, config);
        self
    }

    pub fn for_bucket(&self, bucket: ContentBucket) -> ChunkConfig {
        self.overrides.get(&bucket).copied().unwrap_or(self.default)
    }
}

/// Bucket-aware chunking pipeline.
pub struct ChunkPipeline {
    profiles: ChunkProfiles,
}

/// Output order of the buckets.
const BUCKET_ORDER: [ContentBucket; 4] = [
    ContentBucket::Markdown,
    ContentBucket::Markup,
    ContentBucket::Script,
    ContentBucket::Other,
];

impl ChunkPipeline {
    pub fn new(profiles: ChunkProfiles) -> Self {
        Self { profiles }
    }

    /// Chunk every document, grouped by bucket.
    ///
    /// Excluded documents (tests, snapshots) contribute nothing.
    pub fn process(&self, documents: &[SourceDocument]) -> AppResult<Vec<Chunk>> {
        let mut grouped: BTreeMap<ContentBucket, Vec<&SourceDocument>> = BTreeMap::new();
        for doc in documents {
            grouped.entry(classify(&doc.source)).or_default().push(doc);
        }

        if let Some(excluded) = grouped.get(&ContentBucket::Excluded) {
            tracing::debug!("Skipping {} excluded documents", excluded.len());
        }

        let mut chunks = Vec::new();
        for bucket in BUCKET_ORDER {
            let Some(docs) = grouped.get(&bucket) else {
                continue;
            };

            let config = self.profiles.for_bucket(bucket);
            let before = chunks.len();
            for doc in docs {
                chunks.extend(self.split_with(bucket, doc, &config)?);
            }

            tracing::info!(
                "Chunked {} {} documents into {} chunks",
                docs.len(),
                bucket.as_str(),
                chunks.len() - before
            );
        }

        Ok(chunks)
    }

    /// Chunk a single document according to its bucket.
    pub fn split_document(&self, doc: &SourceDocument) -> AppResult<Vec<Chunk>> {
        let bucket = classify(&doc.source);
        let config = self.profiles.for_bucket(bucket);
        self.split_with(bucket, doc, &config)
    }

    fn split_with(
        &self,
        bucket: ContentBucket,
        doc: &SourceDocument,
        config: &ChunkConfig,
    ) -> AppResult<Vec<Chunk>> {
        let splitter: Box<dyn ChunkSplitter> = match bucket {
            ContentBucket::Excluded => return Ok(Vec::new()),
            ContentBucket::Markdown => Box::new(MarkdownSplitter),
            ContentBucket::Markup => Box::new(CodeSplitter::markup()),
            ContentBucket::Script => {
                Box::new(CodeSplitter::script(ScriptLanguage::from_path(&doc.source)))
            }
            ContentBucket::Other => Box::new(TextSplitter),
        };

        splitter.split(&doc.source, &doc.content, config)
    }
}
