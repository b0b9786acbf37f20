//! Chunking of transcripts into overlapping, retrievable spans.

mod splitter;

pub use splitter::{Span, TextSplitter};

use crate::error::{PodragError, Result};
use crate::loader::{Document, EpisodeMetadata};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// A span of a document's text, the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub text: String,
    /// Metadata of the parent document.
    pub metadata: EpisodeMetadata,
    /// Offset of the chunk within the document text, in characters.
    pub start_index: usize,
    /// Order of this chunk within its document.
    pub order: usize,
}

/// Validated chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkingConfig {
    /// Create a config. The overlap must be smaller than the chunk size.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(PodragError::Config("chunk size must be positive".to_string()));
        }
        if overlap >= chunk_size {
            return Err(PodragError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 300,
            overlap: 100,
        }
    }
}

/// Split one document into chunks.
pub fn chunk_document(document: &Document, splitter: &TextSplitter) -> Vec<Chunk> {
    splitter
        .split(&document.text)
        .into_iter()
        .enumerate()
        .map(|(order, span)| Chunk {
            text: span.text,
            metadata: document.metadata.clone(),
            start_index: span.start,
            order,
        })
        .collect()
}

/// Split documents into chunks, preserving document order.
#[instrument(skip_all, fields(documents = documents.len()))]
pub fn split_documents(documents: &[Document], config: ChunkingConfig) -> Vec<Chunk> {
    let splitter = TextSplitter::new(config);
    let chunks: Vec<Chunk> = documents
        .iter()
        .flat_map(|doc| chunk_document(doc, &splitter))
        .collect();

    info!("Split {} documents into {} chunks", documents.len(), chunks.len());
    chunks
}
