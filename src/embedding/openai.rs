//! OpenAI embeddings implementation.

use super::Embedder;
use crate::error::{PodragError, Result};
use crate::openai::{create_client_with_timeout, OpenAIClient};
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI has a limit on batch size.
const BATCH_SIZE: usize = 100;

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: OpenAIClient,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder with a request timeout.
    pub fn with_timeout(model: &str, dimensions: usize, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(timeout)?,
            model: model.to_string(),
            dimensions,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| PodragError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(BATCH_SIZE) {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(EmbeddingInput::StringArray(chunk.to_vec()))
                .dimensions(self.dimensions as u32)
                .build()
                .map_err(|e| PodragError::Embedding(format!("Failed to build request: {}", e)))?;

            let response = self
                .client
                .embeddings()
                .create(request)
                .await
                .map_err(|e| PodragError::OpenAI(format!("Embedding API error: {}", e)))?;

            // Sort by index to ensure correct order
            let mut embeddings: Vec<_> = response.data.into_iter().collect();
            embeddings.sort_by_key(|e| e.index);

            for embedding_data in embeddings {
                if embedding_data.embedding.len() != self.dimensions {
                    return Err(PodragError::DimensionMismatch {
                        expected: self.dimensions,
                        actual: embedding_data.embedding.len(),
                    });
                }
                all_embeddings.push(embedding_data.embedding);
            }
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_label(&self) -> String {
        format!("openai:{}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout() -> Duration {
        Duration::from_secs(30)
    }

    #[test]
    fn test_embedder_creation() {
        let embedder = OpenAIEmbedder::with_timeout("text-embedding-3-small", 1536, timeout()).unwrap();
        assert_eq!(embedder.dimensions(), 1536);
        assert_eq!(embedder.model_label(), "openai:text-embedding-3-small");

        let embedder = OpenAIEmbedder::with_timeout("text-embedding-3-large", 3072, timeout()).unwrap();
        assert_eq!(embedder.dimensions(), 3072);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let embedder = OpenAIEmbedder::with_timeout("text-embedding-3-small", 1536, timeout()).unwrap();
        let embeddings = embedder.embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }
}
