//! Configuration module for podrag.
//!
//! Handles loading settings (TOML file plus environment overrides) and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingKind, EmbeddingProvider, EmbeddingSettings, GeneralSettings,
    LoggingSettings, PromptSettings, RagSettings, Settings, StorageSettings, VectorStoreSettings,
};
