//! Folders command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::remote::ObjectStoreGateway;
use anyhow::Result;

/// Run the folders command.
pub async fn run_folders(prefix: Option<&str>, settings: &Settings) -> Result<()> {
    preflight::check(Operation::Remote, settings)?;

    let gateway = ObjectStoreGateway::from_settings(settings)?;
    let prefix = prefix.unwrap_or(&settings.storage.transcripts_prefix);

    let folders = match settings.cutoff_date()? {
        Some(cutoff) => {
            Output::info(&format!("Folders under '{}' after {}", prefix, cutoff.format("%Y/%m/%d")));
            gateway.folders_after_cutoff(prefix, cutoff).await?
        }
        None => {
            Output::info(&format!("Folders under '{}' (no cutoff date set)", prefix));
            gateway.list_folders(prefix).await?
        }
    };

    if folders.is_empty() {
        Output::info("No folders found.");
    }
    for folder in &folders {
        Output::list_item(folder);
    }

    Ok(())
}
