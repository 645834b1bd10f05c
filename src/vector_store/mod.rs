//! Vector store abstraction for Laere.
//!
//! Provides a trait-based interface for different vector database backends.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chunk of source material stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Unique chunk ID.
    pub id: Uuid,
    /// Path or URI of the source this chunk came from.
    pub source_path: String,
    /// Human-readable source title.
    pub source_title: String,
    /// Section heading, when the source was split on headings.
    pub section: Option<String>,
    /// Text content of this chunk.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// Order of this chunk within its source.
    pub chunk_order: i32,
    /// When this chunk was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl KnowledgeChunk {
    /// Create a new chunk.
    pub fn new(
        source_path: String,
        source_title: String,
        section: Option<String>,
        content: String,
        embedding: Vec<f32>,
        chunk_order: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_path,
            source_title,
            section,
            content,
            embedding,
            chunk_order,
            indexed_at: Utc::now(),
        }
    }

    /// First `max_chars` characters of the content, flattened to one line.
    pub fn preview(&self, max_chars: usize) -> String {
        let flat = self.content.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.chars().count() <= max_chars {
            flat
        } else {
            let mut cut: String = flat.chars().take(max_chars).collect();
            cut.push_str("...");
            cut
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The matched chunk.
    pub chunk: KnowledgeChunk,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Summary information about an indexed source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSource {
    /// Source path or URI.
    pub source_path: String,
    /// Source title.
    pub source_title: String,
    /// Number of indexed chunks.
    pub chunk_count: u32,
    /// When the source was indexed.
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store a chunk with its embedding.
    async fn upsert(&self, chunk: &KnowledgeChunk) -> Result<()>;

    /// Bulk upsert chunks.
    async fn upsert_batch(&self, chunks: &[KnowledgeChunk]) -> Result<usize>;

    /// Search for similar chunks.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>>;

    /// Search with a minimum similarity threshold.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchHit>>;

    /// Delete all chunks of a source.
    async fn delete_by_source(&self, source_path: &str) -> Result<usize>;

    /// List all indexed sources.
    async fn list_sources(&self) -> Result<Vec<IndexedSource>>;

    /// Get a specific source's information.
    async fn get_source(&self, source_path: &str) -> Result<Option<IndexedSource>>;

    /// Check if a source is indexed.
    async fn is_source_indexed(&self, source_path: &str) -> Result<bool>;

    /// Get all chunks of a source, in order.
    async fn get_by_source(&self, source_path: &str) -> Result<Vec<KnowledgeChunk>>;

    /// Get total chunk count.
    async fn chunk_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_chunk_preview() {
        let chunk = KnowledgeChunk::new(
            "notes/rust.md".to_string(),
            "Rust Notes".to_string(),
            None,
            "ownership and\nborrowing rules".to_string(),
            vec![],
            0,
        );

        assert_eq!(chunk.preview(100), "ownership and borrowing rules");
        assert_eq!(chunk.preview(9), "ownership...");
    }
}
