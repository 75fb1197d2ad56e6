//! Top-K similarity retrieval over a loaded index.

use crate::embeddings::EmbeddingProvider;
use crate::index::DocumentIndex;
use crate::rag::types::RetrievedChunk;
use docchat_core::AppResult;
use std::sync::Arc;

pub struct Retriever {
    index: Arc<DocumentIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(index: Arc<DocumentIndex>, embedder: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    /// Embed the question and return the `top_k` closest chunks.
    ///
    /// An empty index or a blank question returns nothing without calling
    /// the embedder.
    #[tracing::instrument(level = "debug", skip(self), fields(top_k = self.top_k))]
    pub async fn retrieve(&self, question: &str) -> AppResult<Vec<RetrievedChunk>> {
        if self.index.is_empty() || question.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(question).await?;
        let hits: Vec<RetrievedChunk> = self
            .index
            .search(&query, self.top_k)
            .into_iter()
            .map(|(entry, score)| RetrievedChunk {
                text: entry.text.clone(),
                source: entry.source.clone(),
                position: entry.position,
                score,
            })
            .collect();

        tracing::debug!(
            "Retrieved {} chunks (best score {:.3})",
            hits.len(),
            hits.first().map(|h| h.score).unwrap_or(0.0)
        );

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ContentBucket;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use crate::index::{IndexEntry, IndexManifest, FORMAT_VERSION};
    use chrono::Utc;

    async fn index_of(texts: &[(&str, &str)], provider: &TrigramProvider) -> DocumentIndex {
        let mut entries = Vec::new();
        for (i, (source, text)) in texts.iter().enumerate() {
            entries.push(IndexEntry {
                id: format!("{}#0", source),
                source: source.to_string(),
                position: i as u32,
                bucket: ContentBucket::Markdown,
                text: text.to_string(),
                embedding: provider.embed(text).await.unwrap(),
            });
        }
        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            dataset: "shop".to_string(),
            embedding_provider: "trigram".to_string(),
            embedding_model: "trigram-v1".to_string(),
            dimensions: provider.dimensions(),
            entry_count: entries.len(),
            built_at: Utc::now(),
        };
        DocumentIndex::new(manifest, entries)
    }

    #[tokio::test]
    async fn test_retrieves_closest() {
        let provider = TrigramProvider::new(256);
        let index = index_of(
            &[
                ("billing.md", "Billing: invoices are emailed monthly to the account owner."),
                ("install.md", "Installation: run composer install to install the storefront."),
            ],
            &provider,
        )
        .await;

        let retriever = Retriever::new(Arc::new(index), Arc::new(TrigramProvider::new(256)), 1);
        let hits = retriever.retrieve("How do I install this?").await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, "install.md");
    }

    #[tokio::test]
    async fn test_top_k_caps_results() {
        let provider = TrigramProvider::new(64);
        let index = index_of(&[("a.md", "alpha"), ("b.md", "bravo"), ("c.md", "charlie")], &provider).await;

        let retriever = Retriever::new(Arc::new(index), Arc::new(TrigramProvider::new(64)), 2);
        assert_eq!(retriever.retrieve("alpha bravo").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_question_returns_nothing() {
        let provider = TrigramProvider::new(64);
        let index = index_of(&[("a.md", "alpha")], &provider).await;

        let retriever = Retriever::new(Arc::new(index), Arc::new(TrigramProvider::new(64)), 4);
        assert!(retriever.retrieve("   ").await.unwrap().is_empty());
    }
}
