//! Splitter implementations wrapper module.

mod code;
mod markdown;
mod text;

pub use code::CodeSplitter;
pub use markdown::MarkdownSplitter;
pub use text::TextSplitter;

use crate::chunk::{Chunk, ChunkConfig, ContentBucket};
use docchat_core::{AppError, AppResult};
use text_splitter::{Characters, ChunkConfig as SplitterConfig};

/// Trait for chunk splitters.
pub trait ChunkSplitter {
    /// Split a document into chunks.
    fn split(&self, source: &str, text: &str, config: &ChunkConfig) -> AppResult<Vec<Chunk>>;
}

/// Character-sized settings for the text-splitter crate.
///
/// Trimming stays off so that chunks are exact slices and the document can
/// be reassembled from them byte for byte.
fn splitter_config(config: &ChunkConfig) -> AppResult<SplitterConfig<Characters>> {
    SplitterConfig::new(config.chunk_size)
        .with_overlap(config.chunk_overlap)
        .map(|c| c.with_trim(false))
        .map_err(|e| AppError::Knowledge(format!("Invalid chunk configuration: {}", e)))
}

fn collect_chunks<'a>(
    source: &str,
    bucket: ContentBucket,
    splitter_used: &str,
    pieces: impl Iterator<Item = (usize, &'a str)>,
) -> Vec<Chunk> {
    pieces
        .enumerate()
        .map(|(position, (offset, text))| {
            Chunk::new(source, position as u32, text, offset, bucket, splitter_used)
        })
        .collect()
}
