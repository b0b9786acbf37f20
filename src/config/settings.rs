//! Configuration settings for podrag.

use crate::chunking::ChunkingConfig;
use crate::error::{PodragError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub storage: StorageSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub vector_store: VectorStoreSettings,
    pub rag: RagSettings,
    pub logging: LoggingSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory holding the local transcript files.
    pub data_dir: String,
    /// Directory for application state (vector store, run logs).
    pub state_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.podrag/transcripts".to_string(),
            state_dir: "~/.podrag".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Remote object store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Bucket holding transcripts and archived logs.
    pub bucket: Option<String>,
    /// Bucket region.
    pub region: String,
    /// Key prefix under which transcripts are published.
    pub transcripts_prefix: String,
    /// Only dated folders after this day count as new (YYYY/MM/DD).
    pub cutoff_date: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            bucket: None,
            region: "us-east-1".to_string(),
            transcripts_prefix: "transcriptions".to_string(),
            cutoff_date: None,
        }
    }
}

/// Which family of embedding model to use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingKind {
    /// Sentence-embedding model executed locally.
    #[default]
    Local,
    /// Remote OpenAI embeddings API.
    OpenAI,
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (local, openai).
    pub provider: EmbeddingKind,
    /// Local sentence-embedding model name.
    pub local_model: String,
    /// OpenAI embedding model name.
    pub openai_model: String,
    /// Dimensions requested from the OpenAI model.
    pub dimensions: u32,
    /// Where local model files are cached.
    pub cache_dir: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingKind::Local,
            local_model: "all-MiniLM-L6-v2".to_string(),
            openai_model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            cache_dir: None,
        }
    }
}

/// The embedding model chosen for this process, resolved once from settings.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingProvider {
    Local {
        model: String,
        cache_dir: Option<PathBuf>,
    },
    OpenAI {
        model: String,
        dimensions: usize,
    },
}

impl EmbeddingProvider {
    /// Label recorded with a collection so mismatched models can be reported.
    pub fn label(&self) -> String {
        match self {
            EmbeddingProvider::Local { model, .. } => format!("local:{}", model),
            EmbeddingProvider::OpenAI { model, .. } => format!("openai:{}", model),
        }
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 300,
            chunk_overlap: 100,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Directory holding the persisted collection.
    pub path: String,
    /// Collection name.
    pub collection: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            path: "~/.podrag/store".to_string(),
            collection: "podcast_transcripts".to_string(),
        }
    }
}

/// Retrieval and chat settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Chat model used for answers.
    pub model: String,
    /// Number of chunks retrieved per query.
    pub top_k: usize,
    /// Best-score threshold below which a query has no matching results.
    pub min_relevance: f32,
    /// Timeout for OpenAI requests in seconds.
    pub timeout_secs: u64,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            top_k: 6,
            min_relevance: 0.3,
            timeout_secs: crate::openai::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Run log archiving settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingSettings {
    /// Key prefix for archived run logs. Archiving is off when unset.
    pub archive_prefix: Option<String>,
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory containing a custom `rag.toml` (overrides defaults).
    pub custom_dir: Option<String>,
}

impl Settings {
    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Load, apply environment overrides and validate.
    pub fn resolve(path: Option<&PathBuf>) -> Result<Self> {
        let mut settings = Self::load_from(path)?;
        settings.apply_env();
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| PodragError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("podrag")
            .join("config.toml")
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()));
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("RAG_LOCAL_DATA_PATH") {
            self.general.data_dir = dir;
        }

        if let Some(selector) = lookup("RAG_EMBEDDING") {
            if selector.trim() == "OPENAI" {
                self.embedding.provider = EmbeddingKind::OpenAI;
            } else {
                self.embedding.provider = EmbeddingKind::Local;
                self.embedding.local_model = selector.trim().to_string();
            }
        }

        if let Some(bucket) = lookup("S3_BUCKET") {
            self.storage.bucket = Some(bucket);
        }
        if let Some(region) = lookup("AWS_REGION") {
            self.storage.region = region;
        }
        if let Some(cutoff) = lookup("CUTOFFDATE") {
            self.storage.cutoff_date = Some(cutoff);
        }
        if let Some(prefix) = lookup("RAG_LOG") {
            self.logging.archive_prefix = Some(prefix);
        }
        if let Some(level) = lookup("LOGGINGLEVEL") {
            self.general.log_level = level_from_env(&level).to_string();
        }
    }

    /// Check invariants that would otherwise produce silently wrong results.
    pub fn validate(&self) -> Result<()> {
        if self.general.data_dir.trim().is_empty() {
            return Err(PodragError::Config("general.data_dir is empty".to_string()));
        }
        self.chunking_config()?;
        if self.rag.top_k == 0 {
            return Err(PodragError::Config("rag.top_k must be at least 1".to_string()));
        }
        if self.embedding.provider == EmbeddingKind::OpenAI && self.embedding.dimensions == 0 {
            return Err(PodragError::Config("embedding.dimensions must be positive".to_string()));
        }
        self.cutoff_date()?;
        Ok(())
    }

    /// Resolve the embedding selector into a concrete provider.
    pub fn embedding_provider(&self) -> EmbeddingProvider {
        match self.embedding.provider {
            EmbeddingKind::Local => EmbeddingProvider::Local {
                model: self.embedding.local_model.clone(),
                cache_dir: self.embedding.cache_dir.as_deref().map(Self::expand_path),
            },
            EmbeddingKind::OpenAI => EmbeddingProvider::OpenAI {
                model: self.embedding.openai_model.clone(),
                dimensions: self.embedding.dimensions as usize,
            },
        }
    }

    /// Validated chunking parameters.
    pub fn chunking_config(&self) -> Result<ChunkingConfig> {
        ChunkingConfig::new(self.chunking.chunk_size, self.chunking.chunk_overlap)
    }

    /// Parsed cutoff date, if configured.
    pub fn cutoff_date(&self) -> Result<Option<NaiveDate>> {
        self.storage
            .cutoff_date
            .as_deref()
            .map(|raw| {
                let raw = raw.trim();
                NaiveDate::parse_from_str(raw, "%Y/%m/%d")
                    .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
                    .map_err(|e| {
                        PodragError::Config(format!("Invalid cutoff date '{}': {}", raw, e))
                    })
            })
            .transpose()
    }

    /// Bucket name, or a configuration error for commands that need one.
    pub fn require_bucket(&self) -> Result<&str> {
        self.storage
            .bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| {
                PodragError::Config("No bucket configured. Set S3_BUCKET or storage.bucket.".to_string())
            })
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded transcript directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded state directory path.
    pub fn state_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.state_dir)
    }

    /// Get the expanded vector store directory.
    pub fn store_dir(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.path)
    }

    /// Directory for run logs.
    pub fn log_dir(&self) -> PathBuf {
        self.state_dir().join("logs")
    }

    /// Timeout applied to remote embedding and chat requests.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.rag.timeout_secs)
    }
}

/// Map the LOGGINGLEVEL vocabulary onto tracing levels. Unknown values mean debug.
fn level_from_env(value: &str) -> &'static str {
    match value.trim().to_uppercase().as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARNING" | "WARN" => "warn",
        "ERROR" => "error",
        _ => "debug",
    }
}
