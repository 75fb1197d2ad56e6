//! Document knowledge for docchat.
//!
//! Turns a dataset directory into a persisted vector index and answers
//! questions over it:
//! - [`scan`] and [`ingest`] enumerate and read the dataset's files
//! - [`chunk`] classifies each file and splits it at content-aware boundaries
//! - [`embeddings`] turns chunks into vectors
//! - [`index`] persists the vectors in SQLite and loads them back
//! - [`rag`] retrieves context, drafts answers and validates their links

pub mod chunk;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod ingest;
pub mod progress;
pub mod rag;
pub mod scan;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::{get_config_path, get_index_path, load_config, save_config};
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use index::{DocumentIndex, IndexBuilder, IndexEntry, IndexManifest};
pub use progress::{ProgressEvent, ProgressReporter};
pub use rag::{ChatAnswer, ChatEngine, HttpProbe, LinkProbe};
pub use types::{IndexStats, KnowledgeBaseConfig, SourceDocument};
