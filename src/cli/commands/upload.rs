//! Upload command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::remote::ObjectStoreGateway;
use anyhow::Result;
use std::path::Path;

/// Run the upload command.
pub async fn run_upload(path: &str, key: Option<&str>, settings: &Settings) -> Result<()> {
    preflight::check(Operation::Remote, settings)?;

    let gateway = ObjectStoreGateway::from_settings(settings)?;
    let path = Settings::expand_path(path);

    if path.is_dir() {
        let report = gateway.upload_folder(&path, key).await?;
        Output::success(&format!("Uploaded {} files", report.success));
        if report.failed > 0 {
            Output::warning(&format!("{} uploads failed", report.failed));
            for error in &report.errors {
                Output::list_item(error);
            }
        }
    } else {
        let written = gateway.upload_file(Path::new(&path), key).await?;
        Output::success(&format!("Uploaded to s3://{}/{}", gateway.bucket(), written));
    }

    Ok(())
}
