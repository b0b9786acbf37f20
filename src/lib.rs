//! podrag - retrieval-augmented question answering over podcast transcripts
//!
//! # Overview
//!
//! podrag:
//! - Syncs transcript files (JSON records stored as `.txt`) from an S3 bucket
//! - Splits them into overlapping chunks and embeds them with a local or OpenAI model
//! - Stores the vectors in a local SQLite collection, rebuilt wholesale on each build
//! - Answers questions from the most relevant chunks and cites the source episodes
//!
//! # Architecture
//!
//! - `config` - Settings file, environment overrides and prompt templates
//! - `logging` - Tracing setup and run-log archiving
//! - `remote` - Object store gateway and transcript sync
//! - `loader` - Transcript parsing into documents
//! - `chunking` - Overlapping text splitting
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector collection storage and similarity search
//! - `rag` - Context assembly, conversation sessions and answers
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use podrag::config::Settings;
//! use podrag::orchestrator::Orchestrator;
//! use podrag::rag::ChatSession;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::resolve(None)?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let report = orchestrator.build().await?;
//!     println!("Indexed {} chunks", report.entries_written);
//!
//!     let responder = orchestrator.responder()?;
//!     let mut session = ChatSession::new();
//!     let response = responder.respond(&mut session, "What was the last episode about?").await?;
//!     println!("{}", response.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod loader;
pub mod logging;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod remote;
pub mod vector_store;

#[cfg(test)]
mod test_support;

pub use error::{PodragError, Result};
