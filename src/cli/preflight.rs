//! Pre-flight checks before expensive operations.
//!
//! Validates that required credentials and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::{EmbeddingKind, Settings};
use crate::error::{PodragError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Rebuilding embeds every chunk.
    Build,
    /// Answering questions needs the chat model and query embeddings.
    Ask,
    /// Search embeds the query only.
    Search,
    /// Bucket access.
    Remote,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_with(operation, settings, |key| std::env::var(key).ok())
}

fn check_with<F>(operation: Operation, settings: &Settings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let remote_embeddings = settings.embedding.provider == EmbeddingKind::OpenAI;

    match operation {
        Operation::Build | Operation::Search => {
            if remote_embeddings {
                check_api_key(&lookup)?;
            }
        }
        Operation::Ask => {
            check_api_key(&lookup)?;
        }
        Operation::Remote => {
            settings.require_bucket()?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key<F>(lookup: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("OPENAI_API_KEY") {
        Some(key) if !key.is_empty() => Ok(()),
        Some(_) => Err(PodragError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        None => Err(PodragError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_local_search_has_no_requirements() {
        let settings = Settings::default();
        assert!(check_with(Operation::Search, &settings, no_env).is_ok());
        assert!(check_with(Operation::Build, &settings, no_env).is_ok());
    }

    #[test]
    fn test_ask_requires_api_key() {
        let settings = Settings::default();
        let err = check_with(Operation::Ask, &settings, no_env).unwrap_err();
        assert!(err.is_fatal());

        let with_key = |key: &str| (key == "OPENAI_API_KEY").then(|| "sk-test".to_string());
        assert!(check_with(Operation::Ask, &settings, with_key).is_ok());
    }

    #[test]
    fn test_openai_embeddings_require_api_key() {
        let mut settings = Settings::default();
        settings.embedding.provider = EmbeddingKind::OpenAI;
        assert!(check_with(Operation::Build, &settings, no_env).is_err());
    }

    #[test]
    fn test_remote_requires_bucket() {
        let mut settings = Settings::default();
        assert!(check_with(Operation::Remote, &settings, no_env).is_err());

        settings.storage.bucket = Some("podcast.monitor".to_string());
        assert!(check_with(Operation::Remote, &settings, no_env).is_ok());
    }
}
