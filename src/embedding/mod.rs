//! Text embedding behind a trait so stores and tests can swap providers.

mod openai;

pub use openai::OpenAIEmbedder;

use async_trait::async_trait;

use crate::error::Result;

/// Turns text into vectors for similarity search over indexed sources.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single query or chunk.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Dimensionality of the produced vectors.
    fn dimensions(&self) -> usize;
}
