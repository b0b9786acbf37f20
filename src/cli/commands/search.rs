//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::context::format_result_for_display;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, settings: &Settings) -> Result<()> {
    preflight::check(Operation::Search, settings)?;

    let orchestrator = Orchestrator::new(settings.clone())?;
    let responder = orchestrator.responder()?;
    responder.check_compatibility().await?;

    let spinner = Output::spinner("Searching...");
    let results = responder.search(query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) => {
            if results.is_empty() {
                Output::warning("No results found. Has the collection been built?");
            } else {
                Output::success(&format!("Found {} results", results.len()));
                for result in &results {
                    Output::search_result(&format_result_for_display(result), &result.entry.text);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
