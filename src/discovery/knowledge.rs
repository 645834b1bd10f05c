//! Internal knowledge base as a discovery origin.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::discovery::{DiscoveredSource, SearchQuery, SearchSource, SourceOrigin};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorStore;

/// Characters of chunk content carried into a source snippet.
const SNIPPET_CHARS: usize = 200;

/// Discovery origin backed by the indexed knowledge base.
///
/// Embeds the query, runs a similarity search, and reports hits with their
/// real similarity scores. Relevance policy (thresholds, sufficiency) is the
/// orchestrator's concern, not this source's.
pub struct KnowledgeSource {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    min_score: f32,
}

impl KnowledgeSource {
    /// Create a knowledge source over a store and embedder.
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            min_score: 0.0,
        }
    }

    /// Set a store-level similarity floor.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }
}

#[async_trait]
impl SearchSource for KnowledgeSource {
    fn origin(&self) -> SourceOrigin {
        SourceOrigin::Internal
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<DiscoveredSource>> {
        let query_embedding = self.embedder.embed(&query.query).await?;

        let hits = self
            .store
            .search_with_threshold(&query_embedding, query.max_results, self.min_score)
            .await?;

        debug!("Knowledge base returned {} hits", hits.len());

        Ok(hits
            .into_iter()
            .map(|hit| {
                DiscoveredSource::new(
                    hit.chunk.source_path.clone(),
                    hit.chunk.source_title.clone(),
                    hit.chunk.preview(SNIPPET_CHARS),
                    SourceOrigin::Internal,
                    hit.score,
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::{KnowledgeChunk, MemoryVectorStore};

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    #[tokio::test]
    async fn test_search_maps_hits_to_internal_sources() {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .upsert_batch(&[
                KnowledgeChunk::new(
                    "notes/ownership.md".to_string(),
                    "Ownership".to_string(),
                    None,
                    "Every value has a single owner.".to_string(),
                    vec![1.0, 0.0, 0.0],
                    0,
                ),
                KnowledgeChunk::new(
                    "notes/traits.md".to_string(),
                    "Traits".to_string(),
                    None,
                    "Traits define shared behavior.".to_string(),
                    vec![0.0, 1.0, 0.0],
                    0,
                ),
            ])
            .await
            .unwrap();

        let source = KnowledgeSource::new(store, Arc::new(StubEmbedder));
        let results = source
            .search(&SearchQuery::new("ownership", 10))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].uri, "notes/ownership.md");
        assert_eq!(results[0].origin, SourceOrigin::Internal);
        assert!((results[0].relevance_score - 1.0).abs() < 0.001);
        assert_eq!(results[0].snippet, "Every value has a single owner.");
    }

    #[tokio::test]
    async fn test_min_score_floors_results() {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .upsert(&KnowledgeChunk::new(
                "notes/far.md".to_string(),
                "Far".to_string(),
                None,
                "unrelated".to_string(),
                vec![0.0, 1.0, 0.0],
                0,
            ))
            .await
            .unwrap();

        let source = KnowledgeSource::new(store, Arc::new(StubEmbedder)).with_min_score(0.5);
        let results = source
            .search(&SearchQuery::new("anything", 10))
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
