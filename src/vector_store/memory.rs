//! In-memory vector store.
//!
//! Backs tests and the `vector_store.provider = "memory"` configuration,
//! where nothing needs to survive the process.

use super::{cosine_similarity, IndexedSource, KnowledgeChunk, SearchHit, VectorStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Chunk map keyed by chunk ID, guarded by a read-write lock.
pub struct MemoryVectorStore {
    chunks: RwLock<HashMap<String, KnowledgeChunk>>,
}

impl MemoryVectorStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, chunk: &KnowledgeChunk) -> Result<()> {
        let mut chunks = self.chunks.write().unwrap();
        chunks.insert(chunk.id.to_string(), chunk.clone());
        Ok(())
    }

    async fn upsert_batch(&self, new_chunks: &[KnowledgeChunk]) -> Result<usize> {
        let mut chunks = self.chunks.write().unwrap();
        for chunk in new_chunks {
            chunks.insert(chunk.id.to_string(), chunk.clone());
        }
        Ok(new_chunks.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        self.search_with_threshold(query_embedding, limit, 0.0).await
    }

    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchHit>> {
        let chunks = self.chunks.read().unwrap();

        let mut hits: Vec<SearchHit> = chunks
            .values()
            .map(|chunk| {
                let score = cosine_similarity(query_embedding, &chunk.embedding);
                SearchHit {
                    chunk: chunk.clone(),
                    score,
                }
            })
            .filter(|h| h.score >= min_score)
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);

        Ok(hits)
    }

    async fn delete_by_source(&self, source_path: &str) -> Result<usize> {
        let mut chunks = self.chunks.write().unwrap();
        let initial_len = chunks.len();
        chunks.retain(|_, chunk| chunk.source_path != source_path);
        Ok(initial_len - chunks.len())
    }

    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let chunks = self.chunks.read().unwrap();

        let mut source_map: HashMap<String, IndexedSource> = HashMap::new();

        for chunk in chunks.values() {
            let entry = source_map
                .entry(chunk.source_path.clone())
                .or_insert_with(|| IndexedSource {
                    source_path: chunk.source_path.clone(),
                    source_title: chunk.source_title.clone(),
                    chunk_count: 0,
                    indexed_at: chunk.indexed_at,
                });

            entry.chunk_count += 1;
            if chunk.indexed_at > entry.indexed_at {
                entry.indexed_at = chunk.indexed_at;
            }
        }

        let mut sources: Vec<IndexedSource> = source_map.into_values().collect();
        sources.sort_by(|a, b| b.indexed_at.cmp(&a.indexed_at));

        Ok(sources)
    }

    async fn get_source(&self, source_path: &str) -> Result<Option<IndexedSource>> {
        let sources = self.list_sources().await?;
        Ok(sources.into_iter().find(|s| s.source_path == source_path))
    }

    async fn is_source_indexed(&self, source_path: &str) -> Result<bool> {
        let chunks = self.chunks.read().unwrap();
        Ok(chunks.values().any(|c| c.source_path == source_path))
    }

    async fn get_by_source(&self, source_path: &str) -> Result<Vec<KnowledgeChunk>> {
        let chunks = self.chunks.read().unwrap();
        let mut result: Vec<KnowledgeChunk> = chunks
            .values()
            .filter(|c| c.source_path == source_path)
            .cloned()
            .collect();
        result.sort_by_key(|c| c.chunk_order);
        Ok(result)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let chunks = self.chunks.read().unwrap();
        Ok(chunks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        let chunk1 = KnowledgeChunk::new(
            "notes/rust.md".to_string(),
            "Rust Notes".to_string(),
            None,
            "Ownership rules".to_string(),
            vec![1.0, 0.0, 0.0],
            0,
        );

        let chunk2 = KnowledgeChunk::new(
            "notes/rust.md".to_string(),
            "Rust Notes".to_string(),
            None,
            "Borrowing rules".to_string(),
            vec![0.0, 1.0, 0.0],
            1,
        );

        store.upsert_batch(&[chunk1, chunk2]).await.unwrap();

        assert_eq!(store.chunk_count().await.unwrap(), 2);

        let hits = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score > hits[1].score);

        let sources = store.list_sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].chunk_count, 2);
    }
}
