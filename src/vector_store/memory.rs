//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{check_dimensions, rank, CollectionInfo, IndexedEpisode, SearchResult, VectorStore, VectorStoreEntry};
use crate::error::{PodragError, Result};
use async_trait::async_trait;
use std::sync::RwLock;

#[derive(Debug, Default)]
struct Collection {
    info: Option<CollectionInfo>,
    entries: Vec<VectorStoreEntry>,
}

/// In-memory vector store.
#[derive(Debug, Default)]
pub struct MemoryVectorStore {
    collection: RwLock<Collection>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> PodragError {
    PodragError::VectorStore(format!("Failed to acquire lock: {}", e))
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn replace_all(&self, info: &CollectionInfo, entries: &[VectorStoreEntry]) -> Result<usize> {
        for entry in entries {
            check_dimensions(info, entry.embedding.len())?;
        }

        let mut collection = self.collection.write().map_err(poisoned)?;
        collection.info = Some(info.clone());
        collection.entries = entries.to_vec();
        Ok(entries.len())
    }

    async fn query(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let collection = self.collection.read().map_err(poisoned)?;

        let Some(info) = &collection.info else {
            return Ok(Vec::new());
        };
        check_dimensions(info, query_embedding.len())?;

        Ok(rank(collection.entries.iter().cloned(), query_embedding, k))
    }

    async fn collection_info(&self) -> Result<Option<CollectionInfo>> {
        let collection = self.collection.read().map_err(poisoned)?;
        Ok(collection.info.clone())
    }

    async fn count(&self) -> Result<usize> {
        let collection = self.collection.read().map_err(poisoned)?;
        Ok(collection.entries.len())
    }

    async fn list_episodes(&self) -> Result<Vec<IndexedEpisode>> {
        let collection = self.collection.read().map_err(poisoned)?;

        let mut episodes: Vec<IndexedEpisode> = Vec::new();
        for entry in &collection.entries {
            match episodes
                .iter_mut()
                .find(|e| e.episode_name == entry.metadata.episode_name)
            {
                Some(episode) => episode.chunk_count += 1,
                None => episodes.push(IndexedEpisode {
                    episode_name: entry.metadata.episode_name.clone(),
                    podcast_name: entry.metadata.podcast_name.clone(),
                    episode_link: entry.metadata.episode_link.clone(),
                    chunk_count: 1,
                }),
            }
        }

        Ok(episodes)
    }

    async fn clear(&self) -> Result<()> {
        let mut collection = self.collection.write().map_err(poisoned)?;
        *collection = Collection::default();
        Ok(())
    }
}
