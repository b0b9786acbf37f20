//! Local sentence-embedding models via fastembed.

use super::Embedder;
use crate::error::{PodragError, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Embedder running an ONNX sentence-embedding model in process.
pub struct LocalEmbedder {
    model: Arc<TextEmbedding>,
    name: String,
    dimensions: usize,
}

impl LocalEmbedder {
    /// Load a model by name (e.g. `all-MiniLM-L6-v2` or `BAAI/bge-small-en-v1.5`).
    ///
    /// Model files are downloaded into `cache_dir` on first use.
    pub fn new(name: &str, cache_dir: Option<&Path>) -> Result<Self> {
        let (model, dimensions) = resolve_model(name)?;

        let mut options = InitOptions::new(model).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir.to_path_buf());
        }

        let model = TextEmbedding::try_new(options).map_err(|e| {
            PodragError::Embedding(format!("Failed to load local model '{}': {}", name, e))
        })?;

        info!("Loaded local embedding model {} ({} dimensions)", name, dimensions);

        Ok(Self {
            model: Arc::new(model),
            name: name.to_string(),
            dimensions,
        })
    }
}

/// Map a user-facing model name onto a supported fastembed model and its dimension.
pub fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize)> {
    let wanted = normalize_model_name(name);

    TextEmbedding::list_supported_models()
        .into_iter()
        .find(|info| normalize_model_name(&info.model_code) == wanted)
        .map(|info| (info.model, info.dim))
        .ok_or_else(|| {
            PodragError::Config(format!("Unsupported local embedding model: {}", name))
        })
}

/// `Qdrant/all-MiniLM-L6-v2-onnx` and `all-minilm-l6-v2` name the same model.
fn normalize_model_name(name: &str) -> String {
    let base = name.rsplit('/').next().unwrap_or(name).to_lowercase();
    base.strip_suffix("-onnx").map(str::to_string).unwrap_or(base)
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| PodragError::Embedding("Empty embedding output".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let input = texts.to_vec();

        // Inference is CPU-bound; keep it off the async workers.
        let embeddings = tokio::task::spawn_blocking(move || model.embed(input, None))
            .await
            .map_err(|e| PodragError::Embedding(format!("Embedding task failed: {}", e)))?
            .map_err(|e| PodragError::Embedding(e.to_string()))?;

        debug!("Generated {} local embeddings", embeddings.len());
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_label(&self) -> String {
        format!("local:{}", self.name)
    }
}
