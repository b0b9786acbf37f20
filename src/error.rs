//! Error types for podrag.

use thiserror::Error;

/// Library-level error type for podrag operations.
#[derive(Error, Debug)]
pub enum PodragError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error(
        "Embedding dimension mismatch: collection stores {expected}-dimensional vectors \
         but the active model produces {actual}. Rebuild the collection with `podrag build`."
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Chat completion failed: {0}")]
    Chat(String),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl PodragError {
    /// Whether the error means the process cannot produce correct answers at all.
    ///
    /// Configuration problems and embedding dimension mismatches are fatal; service
    /// failures for a single query are not.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PodragError::Config(_) | PodragError::DimensionMismatch { .. }
        )
    }
}

/// Result type alias for podrag operations.
pub type Result<T> = std::result::Result<T, PodragError>;
