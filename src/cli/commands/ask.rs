//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::ChatSession;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings.clone())?;
    let responder = orchestrator.responder()?;
    responder.check_compatibility().await?;

    let spinner = Output::spinner("Searching transcripts...");
    let result = responder.respond(&mut ChatSession::new(), question).await;
    spinner.finish_and_clear();

    match result {
        Ok(response) => {
            println!("\n{}\n", response.format_for_display());
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
