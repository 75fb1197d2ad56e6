//! Markdown splitter using text-splitter's CommonMark-aware splitter.

use super::{collect_chunks, splitter_config, ChunkSplitter};
use crate::chunk::{Chunk, ChunkConfig, ContentBucket};
use docchat_core::AppResult;
use text_splitter::MarkdownSplitter as ExternalMarkdownSplitter;

pub struct MarkdownSplitter;

impl ChunkSplitter for MarkdownSplitter {
    fn split(&self, source: &str, text: &str, config: &ChunkConfig) -> AppResult<Vec<Chunk>> {
        let splitter = ExternalMarkdownSplitter::new(splitter_config(config)?);
        let chunks = collect_chunks(
            source,
            ContentBucket::Markdown,
            "markdown",
            splitter.chunk_indices(text),
        );

        tracing::debug!(
            "Markdown splitter created {} chunks from {} bytes",
            chunks.len(),
            text.len()
        );

        Ok(chunks)
    }
}
