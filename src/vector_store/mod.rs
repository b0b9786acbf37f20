//! Vector store abstraction for podrag.
//!
//! A store holds one named collection of embedded chunks. Collections are rebuilt
//! wholesale: `replace_all` clears the previous contents before writing the new ones.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::chunking::Chunk;
use crate::error::{PodragError, Result};
use crate::loader::EpisodeMetadata;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Best-score threshold below which a query is treated as having no matching results.
pub const RELEVANCE_THRESHOLD: f32 = 0.3;

/// An embedded chunk stored in a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreEntry {
    /// Unique entry ID.
    pub id: Uuid,
    /// Chunk text.
    pub text: String,
    /// Episode metadata copied from the source document.
    pub metadata: EpisodeMetadata,
    /// Offset of the chunk within its document, in characters.
    pub start_index: usize,
    /// Order of the chunk within its document.
    pub chunk_order: usize,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

impl VectorStoreEntry {
    /// Create an entry from a chunk and its embedding.
    pub fn from_chunk(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: chunk.text,
            metadata: chunk.metadata,
            start_index: chunk.start_index,
            chunk_order: chunk.order,
            embedding,
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched entry.
    pub entry: VectorStoreEntry,
    /// Relevance score (cosine similarity, higher is better).
    pub score: f32,
}

/// Description of a built collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Collection name.
    pub name: String,
    /// Label of the embedding model the collection was built with.
    pub model: String,
    /// Dimension of every stored vector.
    pub dimensions: usize,
    /// When the collection was last rebuilt.
    pub built_at: DateTime<Utc>,
}

impl CollectionInfo {
    pub fn new(name: &str, model: &str, dimensions: usize) -> Self {
        Self {
            name: name.to_string(),
            model: model.to_string(),
            dimensions,
            built_at: Utc::now(),
        }
    }
}

/// Summary of an indexed episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedEpisode {
    pub episode_name: String,
    pub podcast_name: String,
    pub episode_link: String,
    pub chunk_count: u32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Replace the collection's full contents.
    async fn replace_all(&self, info: &CollectionInfo, entries: &[VectorStoreEntry]) -> Result<usize>;

    /// Return the `k` most relevant entries, best first.
    async fn query(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Information about the built collection, if any.
    async fn collection_info(&self) -> Result<Option<CollectionInfo>>;

    /// Number of stored entries.
    async fn count(&self) -> Result<usize>;

    /// Episodes present in the collection, in build order.
    async fn list_episodes(&self) -> Result<Vec<IndexedEpisode>>;

    /// Remove the collection.
    async fn clear(&self) -> Result<()>;
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

/// Reject vectors whose dimension differs from the collection's.
pub fn check_dimensions(info: &CollectionInfo, actual: usize) -> Result<()> {
    if info.dimensions != actual {
        return Err(PodragError::DimensionMismatch {
            expected: info.dimensions,
            actual,
        });
    }
    Ok(())
}

/// Score entries against a query and keep the best `k`.
///
/// The sort is stable, so equal scores keep insertion order. NaN scores rank last.
pub(crate) fn rank<I>(entries: I, query_embedding: &[f32], k: usize) -> Vec<SearchResult>
where
    I: IntoIterator<Item = VectorStoreEntry>,
{
    let mut results: Vec<SearchResult> = entries
        .into_iter()
        .map(|entry| {
            let score = cosine_similarity(query_embedding, &entry.embedding);
            SearchResult { entry, score }
        })
        .collect();

    results.sort_by(|a, b| {
        a.score
            .is_nan()
            .cmp(&b.score.is_nan())
            .then_with(|| b.score.total_cmp(&a.score))
    });
    results.truncate(k);
    results
}

/// Whether a ranked result list is good enough to answer from.
pub fn has_relevant_match(results: &[SearchResult], threshold: f32) -> bool {
    results.first().is_some_and(|top| top.score >= threshold)
}
