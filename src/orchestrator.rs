//! Pipeline orchestrator for podrag.
//!
//! Coordinates the build pipeline (sync, load, chunk, embed, replace the
//! collection) and wires the query-time responder.

use crate::chunking::split_documents;
use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{PodragError, Result};
use crate::loader::{load_directory, SkippedRecord};
use crate::rag::{ChatModel, OpenAIChat, Responder};
use crate::remote::{sync_flat, ObjectStoreGateway, SyncReport};
use crate::vector_store::{CollectionInfo, SqliteVectorStore, VectorStore, VectorStoreEntry};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The main orchestrator for the podrag pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
}

impl Orchestrator {
    /// Create an orchestrator from configuration: the configured embedder and the
    /// persisted SQLite collection.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;

        let provider = settings.embedding_provider();
        info!("Using embedding model {}", provider.label());
        let embedder = create_embedder(&provider, settings.request_timeout())?;

        let vector_store: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::open(
            &settings.store_dir(),
            &settings.vector_store.collection,
        )?);

        Ok(Self::with_components(settings, prompts, embedder, vector_store))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            settings,
            prompts,
            embedder,
            vector_store,
        }
    }

    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Download new transcripts from the configured bucket into the data directory.
    pub async fn sync(&self) -> Result<SyncReport> {
        let gateway = ObjectStoreGateway::from_settings(&self.settings)?;
        sync_with(&gateway, &self.settings).await
    }

    /// Rebuild the collection from every transcript in the data directory.
    ///
    /// The previous contents are discarded even when no transcript loads.
    #[instrument(skip(self))]
    pub async fn build(&self) -> Result<BuildReport> {
        let data_dir = self.settings.data_dir();
        let ingestion = load_directory(&data_dir)?;
        if !ingestion.skipped.is_empty() {
            warn!("Skipped {} malformed records", ingestion.skipped.len());
        }

        let chunks = split_documents(&ingestion.documents, self.settings.chunking_config()?);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        info!("Embedding {} chunks with {}", texts.len(), self.embedder.model_label());
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(PodragError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let entries: Vec<VectorStoreEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| VectorStoreEntry::from_chunk(chunk, embedding))
            .collect();

        let info = CollectionInfo::new(
            &self.settings.vector_store.collection,
            &self.embedder.model_label(),
            self.embedder.dimensions(),
        );
        let written = self.vector_store.replace_all(&info, &entries).await?;

        info!("Indexed {} chunks from {} documents", written, ingestion.documents.len());

        Ok(BuildReport {
            files_scanned: ingestion.files_scanned,
            documents: ingestion.documents.len(),
            skipped: ingestion.skipped,
            chunks: entries.len(),
            entries_written: written,
        })
    }

    /// A responder answering through `chat`.
    pub fn responder_with(&self, chat: Arc<dyn ChatModel>) -> Responder {
        Responder::new(self.embedder.clone(), self.vector_store.clone(), chat)
            .with_prompts(self.prompts.clone())
            .with_top_k(self.settings.rag.top_k)
            .with_min_relevance(self.settings.rag.min_relevance)
    }

    /// A responder answering through the configured OpenAI chat model.
    pub fn responder(&self) -> Result<Responder> {
        let chat = OpenAIChat::new(&self.settings.rag.model, self.settings.request_timeout())?;
        Ok(self.responder_with(Arc::new(chat)))
    }
}

/// Sync the configured transcripts prefix through an existing gateway.
pub async fn sync_with(gateway: &ObjectStoreGateway, settings: &Settings) -> Result<SyncReport> {
    sync_flat(gateway, &settings.storage.transcripts_prefix, &settings.data_dir()).await
}

/// Result of rebuilding the collection.
#[derive(Debug)]
pub struct BuildReport {
    /// Transcript files read.
    pub files_scanned: usize,
    /// Documents loaded.
    pub documents: usize,
    /// Records that were skipped.
    pub skipped: Vec<SkippedRecord>,
    /// Chunks produced.
    pub chunks: usize,
    /// Entries stored in the collection.
    pub entries_written: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;
    use crate::loader::Document;
    use crate::rag::ChatSession;
    use crate::test_support::{HashEmbedder, ScriptedChat};
    use crate::vector_store::MemoryVectorStore;
    use serde_json::json;
    use std::path::Path;

    fn write_transcript(dir: &Path, file: &str, text: &str, episode: &str) {
        let record = json!({
            "text": text,
            "Episode Name": episode,
            "Podcast Name": "P1",
            "Episode Link": "http://x",
            "duration": 1200
        });
        std::fs::write(dir.join(file), record.to_string()).unwrap();
    }

    fn orchestrator(dir: &Path, dimensions: usize) -> Orchestrator {
        let mut settings = Settings::default();
        settings.general.data_dir = dir.to_string_lossy().to_string();
        Orchestrator::with_components(
            settings,
            Prompts::default(),
            Arc::new(HashEmbedder::new(dimensions)),
            Arc::new(MemoryVectorStore::new()),
        )
    }

    fn chunks_of(orchestrator: &Orchestrator) -> Vec<Chunk> {
        let ingestion = load_directory(&orchestrator.settings().data_dir()).unwrap();
        let documents: Vec<Document> = ingestion.documents;
        split_documents(&documents, orchestrator.settings().chunking_config().unwrap())
    }

    #[tokio::test]
    async fn test_repeated_word_transcript() {
        let dir = tempfile::tempdir().unwrap();
        write_transcript(dir.path(), "e1.txt", &"word ".repeat(200), "E1");

        let orchestrator = orchestrator(dir.path(), 64);
        let report = orchestrator.build().await.unwrap();

        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.documents, 1);
        assert_eq!(report.chunks, 5);
        assert_eq!(report.entries_written, 5);

        let chunks = chunks_of(&orchestrator);
        let starts: Vec<usize> = chunks.iter().map(|c| c.start_index).collect();
        assert_eq!(starts, vec![0, 200, 400, 600, 800]);
        assert_eq!(chunks.last().map(|c| c.start_index + c.text.chars().count()), Some(1000));

        let middle = &chunks[2];
        let responder = orchestrator.responder_with(Arc::new(ScriptedChat::replying("ok")));
        let results = responder.search(&middle.text, 6).await.unwrap();

        assert_eq!(results.len(), 5);
        assert_eq!(results[0].entry.text, middle.text);
        assert!(results[0].score > 0.99);
    }

    #[tokio::test]
    async fn test_middle_chunk_is_top_result() {
        let dir = tempfile::tempdir().unwrap();
        let text: String = (0..300).map(|i| format!("token{} ", i)).collect();
        write_transcript(dir.path(), "e1.txt", &text, "E1");

        let orchestrator = orchestrator(dir.path(), 1024);
        orchestrator.build().await.unwrap();

        let chunks = chunks_of(&orchestrator);
        assert!(chunks.len() > 4);
        let middle = &chunks[chunks.len() / 2];

        let responder = orchestrator.responder_with(Arc::new(ScriptedChat::replying("ok")));
        let results = responder.search(&middle.text, 6).await.unwrap();

        assert_eq!(results[0].entry.chunk_order, middle.order);
        assert_eq!(results[0].entry.start_index, middle.start_index);
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_rebuild_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        write_transcript(dir.path(), "a.txt", "Rust ownership and borrowing explained. ".repeat(20).as_str(), "A");
        write_transcript(dir.path(), "b.txt", "Cooking with cast iron pans. ".repeat(20).as_str(), "B");

        let orchestrator = orchestrator(dir.path(), 128);
        let responder = orchestrator.responder_with(Arc::new(ScriptedChat::replying("ok")));

        orchestrator.build().await.unwrap();
        let first: Vec<(String, f32)> = responder
            .search("ownership borrowing", 6)
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.entry.text, r.score))
            .collect();

        orchestrator.build().await.unwrap();
        let second: Vec<(String, f32)> = responder
            .search("ownership borrowing", 6)
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.entry.text, r.score))
            .collect();

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_build_skips_malformed_records() {
        let dir = tempfile::tempdir().unwrap();
        write_transcript(dir.path(), "good.txt", "A short transcript.", "E1");
        std::fs::write(dir.path().join("bad.txt"), "{not json").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let orchestrator = orchestrator(dir.path(), 32);
        let report = orchestrator.build().await.unwrap();

        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.documents, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.chunks, 1);
        assert_eq!(orchestrator.vector_store().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_directory_clears_collection() {
        let dir = tempfile::tempdir().unwrap();
        write_transcript(dir.path(), "e1.txt", "Something worth indexing.", "E1");

        let orchestrator = orchestrator(dir.path(), 32);
        orchestrator.build().await.unwrap();
        std::fs::remove_file(dir.path().join("e1.txt")).unwrap();

        let report = orchestrator.build().await.unwrap();
        assert_eq!(report.entries_written, 0);
        assert_eq!(orchestrator.vector_store().count().await.unwrap(), 0);

        let responder = orchestrator.responder_with(Arc::new(ScriptedChat::replying("unused")));
        let mut session = ChatSession::new();
        let response = responder.respond(&mut session, "anything").await.unwrap();
        assert!(!response.matched);
    }

    #[tokio::test]
    async fn test_sources_are_deduplicated_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        write_transcript(dir.path(), "a.txt", &"guitar chords practice ".repeat(30), "A");
        write_transcript(dir.path(), "b.txt", &"guitar amplifier tone ".repeat(30), "B");

        let orchestrator = orchestrator(dir.path(), 256);
        orchestrator.build().await.unwrap();

        let chat = Arc::new(ScriptedChat::replying("Strum away!"));
        let responder = orchestrator.responder_with(chat);
        let mut session = ChatSession::new();
        let response = responder.respond(&mut session, "guitar").await.unwrap();

        assert!(response.matched);
        let mut names: Vec<&str> = response.sources.iter().map(|s| s.episode_name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_sync_with_uses_transcripts_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.data_dir = dir.path().to_string_lossy().to_string();

        let gateway = ObjectStoreGateway::in_memory("bucket");
        gateway
            .upload_string("transcriptions/01-02-2025/e1.txt", "{\"text\": \"hi\"}")
            .await
            .unwrap();

        let report = sync_with(&gateway, &settings).await.unwrap();
        assert_eq!(report.downloaded.len(), 1);
        assert!(dir.path().join("e1.txt").exists());
    }
}
