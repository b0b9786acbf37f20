//! Sync command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the sync command.
pub async fn run_sync(settings: &Settings) -> Result<()> {
    preflight::check(Operation::Remote, settings)?;

    let orchestrator = Orchestrator::new(settings.clone())?;
    sync_and_report(&orchestrator).await
}

/// Sync through an orchestrator and print the outcome.
pub(crate) async fn sync_and_report(orchestrator: &Orchestrator) -> Result<()> {
    let settings = orchestrator.settings();
    let spinner = Output::spinner(&format!(
        "Syncing s3://{}/{}...",
        settings.storage.bucket.as_deref().unwrap_or_default(),
        settings.storage.transcripts_prefix
    ));

    let result = orchestrator.sync().await;
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Sync failed: {}", e));
            return Err(e.into());
        }
    };

    if report.downloaded.is_empty() {
        Output::info("No new transcripts.");
    } else {
        Output::success(&format!("Downloaded {} transcripts", report.downloaded.len()));
        for path in &report.downloaded {
            Output::list_item(&path.display().to_string());
        }
    }
    Output::kv("Already present", &report.skipped_existing.to_string());

    if !report.failed.is_empty() {
        Output::warning(&format!("{} downloads failed", report.failed.len()));
        for (key, error) in &report.failed {
            Output::list_item(&format!("{}: {}", key, error));
        }
    }

    Ok(())
}
