//! Embedding generation for chunks and queries.

mod local;
mod openai;

pub use local::{resolve_model, LocalEmbedder};
pub use openai::OpenAIEmbedder;

use crate::config::EmbeddingProvider;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Identifies the model that produced the vectors.
    fn model_label(&self) -> String;
}

/// Create the embedder selected by configuration.
pub fn create_embedder(provider: &EmbeddingProvider, timeout: Duration) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match provider {
        EmbeddingProvider::Local { model, cache_dir } => {
            Arc::new(LocalEmbedder::new(model, cache_dir.as_deref())?)
        }
        EmbeddingProvider::OpenAI { model, dimensions } => {
            Arc::new(OpenAIEmbedder::with_timeout(model, *dimensions, timeout)?)
        }
    };
    Ok(embedder)
}
