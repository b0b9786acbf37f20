//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result as PodragResult;
use crate::vector_store::{SqliteVectorStore, VectorStore};
use anyhow::Result;

/// Open the persisted collection without loading an embedding model.
fn open_store(settings: &Settings) -> PodragResult<SqliteVectorStore> {
    SqliteVectorStore::open(&settings.store_dir(), &settings.vector_store.collection)
}

/// Run the list command.
pub async fn run_list(settings: &Settings) -> Result<()> {
    let store = open_store(settings)?;

    match store.list_episodes().await {
        Ok(episodes) => {
            if episodes.is_empty() {
                Output::info("No episodes indexed yet. Use 'podrag build' to index transcripts.");
                return Ok(());
            }

            Output::header(&format!("Indexed Episodes ({})", episodes.len()));
            println!();

            for episode in &episodes {
                Output::episode_info(
                    &episode.podcast_name,
                    &episode.episode_name,
                    episode.chunk_count,
                    &episode.episode_link,
                );
            }

            let total_chunks: u32 = episodes.iter().map(|e| e.chunk_count).sum();
            println!();
            Output::kv("Total episodes", &episodes.len().to_string());
            Output::kv("Total chunks", &total_chunks.to_string());

            if let Some(info) = store.collection_info().await? {
                Output::kv("Model", &format!("{} ({} dimensions)", info.model, info.dimensions));
                Output::kv("Built", &info.built_at.format("%Y-%m-%d %H:%M UTC").to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list episodes: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::tests::entry;
    use crate::vector_store::CollectionInfo;

    #[tokio::test]
    async fn test_list_reads_store_without_embedding_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.vector_store.path = dir.path().to_string_lossy().to_string();
        settings.embedding.local_model = "definitely-not-a-model".to_string();

        {
            let store = open_store(&settings).unwrap();
            let info = CollectionInfo::new(&settings.vector_store.collection, "test:model", 2);
            store
                .replace_all(&info, &[entry("a", "E1", vec![1.0, 0.0]), entry("b", "E2", vec![0.0, 1.0])])
                .await
                .unwrap();
        }

        let store = open_store(&settings).unwrap();
        let episodes = store.list_episodes().await.unwrap();
        assert_eq!(episodes.len(), 2);
        assert!(run_list(&settings).await.is_ok());
    }
}
