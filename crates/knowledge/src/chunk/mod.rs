//! Content-aware chunking pipeline.
//!
//! Every source document is classified into a [`ContentBucket`] by suffix
//! and split with a boundary-aware splitter for that bucket:
//! - markdown splits at heading and block boundaries
//! - script splits at statement and block boundaries (tree-sitter)
//! - markup splits at tag boundaries (tree-sitter)
//! - everything else splits at paragraph, sentence, then word boundaries
//!
//! Chunks are exact slices of the document. Consecutive chunks may share up
//! to the configured overlap, and together they cover the whole document.

mod classify;
mod pipeline;
pub mod splitters;

pub use classify::{classify, ContentBucket, ScriptLanguage};
pub use pipeline::{ChunkConfig, ChunkPipeline, ChunkProfiles};

use serde::{Deserialize, Serialize};

/// A bounded span of a source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text content
    pub text: String,

    /// Where the chunk came from
    pub metadata: ChunkMetadata,
}

/// Metadata about a chunk's origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source label (path relative to the datasets root)
    pub source: String,

    /// Chunk position in document (0-indexed)
    pub position: u32,

    /// Bucket the document was classified into
    pub bucket: ContentBucket,

    /// Byte range in original document
    pub byte_range: (usize, usize),

    /// Character count
    pub char_count: usize,

    /// Splitter used ("markdown", "code", "text")
    pub splitter_used: String,
}

impl Chunk {
    pub fn new(
        source: &str,
        position: u32,
        text: &str,
        byte_offset: usize,
        bucket: ContentBucket,
        splitter_used: &str,
    ) -> Self {
        Self {
            text: text.to_string(),
            metadata: ChunkMetadata {
                source: source.to_string(),
                position,
                bucket,
                byte_range: (byte_offset, byte_offset + text.len()),
                char_count: text.chars().count(),
                splitter_used: splitter_used.to_string(),
            },
        }
    }
}

/// Stitch a document's chunks back together, dropping overlapped bytes.
#[cfg(test)]
pub(crate) fn reassemble(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    let mut covered = 0usize;

    for chunk in chunks {
        let (start, end) = chunk.metadata.byte_range;
        assert!(start <= covered, "gap before chunk at byte {}", start);
        if end <= covered {
            continue;
        }
        out.push_str(&chunk.text[covered - start..]);
        covered = end;
    }

    out
}
