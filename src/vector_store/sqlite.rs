//! SQLite-backed vector store.
//!
//! Embeddings live in a BLOB column and cosine similarity runs in Rust over
//! a full table scan. Fine at personal-knowledge-base scale; swap in the
//! sqlite-vec extension if the chunk count ever makes scans noticeable.

use super::{cosine_similarity, IndexedSource, KnowledgeChunk, SearchHit, VectorStore};
use crate::error::{LaereError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    id TEXT PRIMARY KEY,
    source_path TEXT NOT NULL,
    source_title TEXT NOT NULL,
    section TEXT,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    chunk_order INTEGER NOT NULL,
    indexed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_source_path ON chunks(source_path);
CREATE INDEX IF NOT EXISTS idx_chunks_indexed_at ON chunks(indexed_at);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open or create the database at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL keeps readers unblocked during batch writes
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, used by tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Pack an embedding as little-endian f32 bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Unpack little-endian f32 bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_chunk(row: &rusqlite::Row<'_>) -> rusqlite::Result<KnowledgeChunk> {
        let id_str: String = row.get(0)?;
        let embedding_bytes: Vec<u8> = row.get(5)?;
        let indexed_at_str: String = row.get(7)?;

        Ok(KnowledgeChunk {
            id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
            source_path: row.get(1)?,
            source_title: row.get(2)?,
            section: row.get(3)?,
            content: row.get(4)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            chunk_order: row.get(6)?,
            indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, chunk))]
    async fn upsert(&self, chunk: &KnowledgeChunk) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LaereError::VectorStore(format!("Failed to acquire lock: {}", e)))?;

        let embedding_bytes = Self::embedding_to_bytes(&chunk.embedding);

        conn.execute(
            r#"
            INSERT OR REPLACE INTO chunks
            (id, source_path, source_title, section, content, embedding, chunk_order, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                chunk.id.to_string(),
                chunk.source_path,
                chunk.source_title,
                chunk.section,
                chunk.content,
                embedding_bytes,
                chunk.chunk_order,
                chunk.indexed_at.to_rfc3339(),
            ],
        )?;

        debug!("Upserted chunk {}", chunk.id);
        Ok(())
    }

    #[instrument(skip(self, chunks))]
    async fn upsert_batch(&self, chunks: &[KnowledgeChunk]) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LaereError::VectorStore(format!("Failed to acquire lock: {}", e)))?;

        let tx = conn.unchecked_transaction()?;

        for chunk in chunks {
            let embedding_bytes = Self::embedding_to_bytes(&chunk.embedding);

            tx.execute(
                r#"
                INSERT OR REPLACE INTO chunks
                (id, source_path, source_title, section, content, embedding, chunk_order, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    chunk.id.to_string(),
                    chunk.source_path,
                    chunk.source_title,
                    chunk.section,
                    chunk.content,
                    embedding_bytes,
                    chunk.chunk_order,
                    chunk.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Batch upserted {} chunks", chunks.len());
        Ok(chunks.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        self.search_with_threshold(query_embedding, limit, 0.0).await
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchHit>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LaereError::VectorStore(format!("Failed to acquire lock: {}", e)))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, source_path, source_title, section, content,
                   embedding, chunk_order, indexed_at
            FROM chunks
            "#,
        )?;

        let chunks = stmt.query_map([], Self::row_to_chunk)?;

        let mut hits: Vec<SearchHit> = chunks
            .filter_map(|chunk_result| chunk_result.ok())
            .map(|chunk| {
                let score = cosine_similarity(query_embedding, &chunk.embedding);
                SearchHit { chunk, score }
            })
            .filter(|h| h.score >= min_score)
            .collect();

        // Sort by score descending
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);

        debug!("Found {} matching chunks", hits.len());
        Ok(hits)
    }

    #[instrument(skip(self))]
    async fn delete_by_source(&self, source_path: &str) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LaereError::VectorStore(format!("Failed to acquire lock: {}", e)))?;

        let deleted = conn.execute(
            "DELETE FROM chunks WHERE source_path = ?1",
            params![source_path],
        )?;

        info!("Deleted {} chunks for source {}", deleted, source_path);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LaereError::VectorStore(format!("Failed to acquire lock: {}", e)))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT source_path, source_title, COUNT(*) as chunk_count,
                   MAX(indexed_at) as indexed_at
            FROM chunks
            GROUP BY source_path
            ORDER BY indexed_at DESC
            "#,
        )?;

        let sources = stmt.query_map([], |row| {
            let indexed_at_str: String = row.get(3)?;
            Ok(IndexedSource {
                source_path: row.get(0)?,
                source_title: row.get(1)?,
                chunk_count: row.get(2)?,
                indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        let result: Vec<IndexedSource> = sources.filter_map(|s| s.ok()).collect();
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn get_source(&self, source_path: &str) -> Result<Option<IndexedSource>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LaereError::VectorStore(format!("Failed to acquire lock: {}", e)))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT source_path, source_title, COUNT(*) as chunk_count,
                   MAX(indexed_at) as indexed_at
            FROM chunks
            WHERE source_path = ?1
            GROUP BY source_path
            "#,
        )?;

        let source = stmt.query_row(params![source_path], |row| {
            let indexed_at_str: String = row.get(3)?;
            Ok(IndexedSource {
                source_path: row.get(0)?,
                source_title: row.get(1)?,
                chunk_count: row.get(2)?,
                indexed_at: DateTime::parse_from_rfc3339(&indexed_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        });

        match source {
            Ok(s) => Ok(Some(s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn is_source_indexed(&self, source_path: &str) -> Result<bool> {
        let source = self.get_source(source_path).await?;
        Ok(source.is_some())
    }

    #[instrument(skip(self))]
    async fn get_by_source(&self, source_path: &str) -> Result<Vec<KnowledgeChunk>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LaereError::VectorStore(format!("Failed to acquire lock: {}", e)))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, source_path, source_title, section, content,
                   embedding, chunk_order, indexed_at
            FROM chunks
            WHERE source_path = ?1
            ORDER BY chunk_order
            "#,
        )?;

        let chunks = stmt.query_map(params![source_path], Self::row_to_chunk)?;

        let result: Vec<KnowledgeChunk> = chunks.filter_map(|c| c.ok()).collect();
        debug!("Found {} chunks for source {}", result.len(), source_path);
        Ok(result)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LaereError::VectorStore(format!("Failed to acquire lock: {}", e)))?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory().unwrap();

        let chunk = KnowledgeChunk::new(
            "notes/tokio.md".to_string(),
            "Tokio Notes".to_string(),
            Some("Runtimes".to_string()),
            "This is test content".to_string(),
            vec![1.0, 0.0, 0.0],
            0,
        );

        store.upsert(&chunk).await.unwrap();

        let sources = store.list_sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source_path, "notes/tokio.md");

        let hits = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!((hits[0].score - 1.0).abs() < 0.001);

        let deleted = store.delete_by_source("notes/tokio.md").await.unwrap();
        assert_eq!(deleted, 1);

        let sources = store.list_sources().await.unwrap();
        assert!(sources.is_empty());
    }

    #[tokio::test]
    async fn test_embedding_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteVectorStore::new(&dir.path().join("knowledge.db")).unwrap();

        let chunk = KnowledgeChunk::new(
            "guide.md".to_string(),
            "Guide".to_string(),
            None,
            "content".to_string(),
            vec![0.25, -0.5, 0.75],
            0,
        );
        store.upsert(&chunk).await.unwrap();

        let stored = store.get_by_source("guide.md").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].embedding, vec![0.25, -0.5, 0.75]);
    }
}
