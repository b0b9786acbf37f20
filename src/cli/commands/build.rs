//! Build command implementation.

use super::sync::sync_and_report;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the build command.
pub async fn run_build(sync: bool, settings: &Settings) -> Result<()> {
    preflight::check(Operation::Build, settings)?;
    if sync {
        preflight::check(Operation::Remote, settings)?;
    }

    let orchestrator = Orchestrator::new(settings.clone())?;

    if sync {
        sync_and_report(&orchestrator).await?;
    }

    let spinner = Output::spinner("Rebuilding collection...");
    let result = orchestrator.build().await;
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Build failed: {}", e));
            return Err(e.into());
        }
    };

    Output::success(&format!(
        "Indexed {} chunks into '{}'",
        report.entries_written, settings.vector_store.collection
    ));
    Output::kv("Files scanned", &report.files_scanned.to_string());
    Output::kv("Documents", &report.documents.to_string());
    Output::kv("Chunks", &report.chunks.to_string());

    if !report.skipped.is_empty() {
        Output::warning(&format!("Skipped {} records", report.skipped.len()));
        for skipped in &report.skipped {
            let location = match skipped.line {
                Some(line) => format!("{}:{}", skipped.file.display(), line),
                None => skipped.file.display().to_string(),
            };
            Output::list_item(&format!("{} ({})", location, skipped.reason));
        }
    }

    Ok(())
}
