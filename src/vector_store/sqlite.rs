//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity. The whole
//! collection is scanned per query, which is fine for a podcast library.

use super::{check_dimensions, rank, CollectionInfo, IndexedEpisode, SearchResult, VectorStore, VectorStoreEntry};
use crate::error::{PodragError, Result};
use crate::loader::EpisodeMetadata;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

/// File name of the database inside the store directory.
pub const DATABASE_FILE: &str = "vectors.db";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS collections (
        name TEXT PRIMARY KEY,
        model TEXT NOT NULL,
        dimensions INTEGER NOT NULL,
        built_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS entries (
        id TEXT PRIMARY KEY,
        collection TEXT NOT NULL,
        seq INTEGER NOT NULL,
        content TEXT NOT NULL,
        episode_name TEXT NOT NULL,
        podcast_name TEXT NOT NULL,
        episode_link TEXT NOT NULL,
        duration TEXT,
        source TEXT NOT NULL,
        start_index INTEGER NOT NULL,
        chunk_order INTEGER NOT NULL,
        embedding BLOB NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_entries_collection ON entries(collection, seq);
"#;

/// SQLite-based vector store bound to one named collection.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    collection: String,
}

impl SqliteVectorStore {
    /// Open (or create) the store in `dir` for the named collection.
    #[instrument(skip_all, fields(collection = %collection))]
    pub fn open(dir: &Path, collection: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(DATABASE_FILE);

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
            collection: collection.to_string(),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory(collection: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            collection: collection.to_string(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PodragError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn read_info(conn: &Connection, collection: &str) -> Result<Option<CollectionInfo>> {
        let row = conn
            .query_row(
                "SELECT name, model, dimensions, built_at FROM collections WHERE name = ?1",
                params![collection],
                |row| {
                    let dimensions: i64 = row.get(2)?;
                    let built_at: String = row.get(3)?;
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, dimensions, built_at))
                },
            )
            .optional()?;

        Ok(row.map(|(name, model, dimensions, built_at)| CollectionInfo {
            name,
            model,
            dimensions: dimensions as usize,
            built_at: DateTime::parse_from_rfc3339(&built_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }))
    }

    fn read_entries(conn: &Connection, collection: &str) -> Result<Vec<VectorStoreEntry>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, content, episode_name, podcast_name, episode_link, duration,
                   source, start_index, chunk_order, embedding
            FROM entries
            WHERE collection = ?1
            ORDER BY seq
            "#,
        )?;

        let rows = stmt.query_map(params![collection], |row| {
            let id_str: String = row.get(0)?;
            let start_index: i64 = row.get(7)?;
            let chunk_order: i64 = row.get(8)?;
            let embedding_bytes: Vec<u8> = row.get(9)?;

            Ok(VectorStoreEntry {
                id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
                text: row.get(1)?,
                metadata: EpisodeMetadata {
                    episode_name: row.get(2)?,
                    podcast_name: row.get(3)?,
                    episode_link: row.get(4)?,
                    duration: row.get(5)?,
                    source: row.get(6)?,
                },
                start_index: start_index as usize,
                chunk_order: chunk_order as usize,
                embedding: Self::bytes_to_embedding(&embedding_bytes),
            })
        })?;

        let entries = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, info, entries), fields(collection = %self.collection, count = entries.len()))]
    async fn replace_all(&self, info: &CollectionInfo, entries: &[VectorStoreEntry]) -> Result<usize> {
        if info.name != self.collection {
            return Err(PodragError::VectorStore(format!(
                "Cannot write collection '{}' through a store bound to '{}'",
                info.name, self.collection
            )));
        }
        for entry in entries {
            check_dimensions(info, entry.embedding.len())?;
        }

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute("DELETE FROM entries WHERE collection = ?1", params![self.collection])?;
        tx.execute(
            r#"
            INSERT OR REPLACE INTO collections (name, model, dimensions, built_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                self.collection,
                info.model,
                info.dimensions as i64,
                info.built_at.to_rfc3339(),
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO entries
                (id, collection, seq, content, episode_name, podcast_name, episode_link,
                 duration, source, start_index, chunk_order, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )?;

            for (seq, entry) in entries.iter().enumerate() {
                stmt.execute(params![
                    entry.id.to_string(),
                    self.collection,
                    seq as i64,
                    entry.text,
                    entry.metadata.episode_name,
                    entry.metadata.podcast_name,
                    entry.metadata.episode_link,
                    entry.metadata.duration,
                    entry.metadata.source,
                    entry.start_index as i64,
                    entry.chunk_order as i64,
                    Self::embedding_to_bytes(&entry.embedding),
                ])?;
            }
        }

        tx.commit()?;
        info!("Replaced collection {} with {} entries", self.collection, entries.len());
        Ok(entries.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn query(&self, query_embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;

        let Some(info) = Self::read_info(&conn, &self.collection)? else {
            debug!("Collection {} has not been built", self.collection);
            return Ok(Vec::new());
        };
        check_dimensions(&info, query_embedding.len())?;

        let entries = Self::read_entries(&conn, &self.collection)?;
        let results = rank(entries, query_embedding, k);

        debug!("Found {} matching entries", results.len());
        Ok(results)
    }

    async fn collection_info(&self) -> Result<Option<CollectionInfo>> {
        let conn = self.lock()?;
        Self::read_info(&conn, &self.collection)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    #[instrument(skip(self))]
    async fn list_episodes(&self) -> Result<Vec<IndexedEpisode>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT episode_name, MIN(podcast_name), MIN(episode_link), COUNT(*) as chunk_count
            FROM entries
            WHERE collection = ?1
            GROUP BY episode_name
            ORDER BY MIN(seq)
            "#,
        )?;

        let rows = stmt.query_map(params![self.collection], |row| {
            Ok(IndexedEpisode {
                episode_name: row.get(0)?,
                podcast_name: row.get(1)?,
                episode_link: row.get(2)?,
                chunk_count: row.get(3)?,
            })
        })?;

        let episodes = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(episodes)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM entries WHERE collection = ?1", params![self.collection])?;
        tx.execute("DELETE FROM collections WHERE name = ?1", params![self.collection])?;
        tx.commit()?;
        info!("Cleared collection {}", self.collection);
        Ok(())
    }
}
