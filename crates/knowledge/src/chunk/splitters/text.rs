//! Generic text splitter using the text-splitter crate.

use super::{collect_chunks, splitter_config, ChunkSplitter};
use crate::chunk::{Chunk, ChunkConfig, ContentBucket};
use docchat_core::AppResult;
use text_splitter::TextSplitter as ExternalTextSplitter;

pub struct TextSplitter;

impl ChunkSplitter for TextSplitter {
    fn split(&self, source: &str, text: &str, config: &ChunkConfig) -> AppResult<Vec<Chunk>> {
        let splitter = ExternalTextSplitter::new(splitter_config(config)?);
        let chunks = collect_chunks(source, ContentBucket::Other, "text", splitter.chunk_indices(text));

        tracing::debug!(
            "Text splitter created {} chunks from {} bytes",
            chunks.len(),
            text.len()
        );

        Ok(chunks)
    }
}
