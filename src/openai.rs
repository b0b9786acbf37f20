//! OpenAI client configuration.

use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Shared client type.
pub type OpenAIClient = Client<OpenAIConfig>;

/// Create an OpenAI client with a custom timeout.
///
/// The API key is read from `OPENAI_API_KEY` by the client configuration.
pub fn create_client_with_timeout(timeout: Duration) -> Result<OpenAIClient> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(OpenAIConfig::default()).with_http_client(http_client))
}
