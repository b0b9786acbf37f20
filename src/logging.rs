//! Tracing setup and run-log archiving.

use crate::config::Settings;
use crate::error::Result;
use crate::remote::ObjectStoreGateway;
use chrono::{Local, NaiveDate};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Name of the local run log inside the log directory.
pub const LOG_FILE_NAME: &str = "podrag.log";

/// Name of the archived log object inside each dated folder.
pub const ARCHIVE_FILE_NAME: &str = "current_rag_log.log";

/// Where this run's log lines start in the local log file.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: Option<PathBuf>,
    start_offset: u64,
}

impl RunLog {
    /// Log text written since this run started.
    pub fn read_current(&self) -> Result<Option<String>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let bytes = std::fs::read(path)?;
        let start = (self.start_offset as usize).min(bytes.len());
        Ok(Some(String::from_utf8_lossy(&bytes[start..]).into_owned()))
    }
}

/// Level used when no `RUST_LOG` is set: `-v` flags beat configuration.
pub fn effective_level(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber: console output on stderr plus an appending run log.
pub fn init(settings: &Settings, verbose: u8) -> RunLog {
    let level = effective_level(verbose, &settings.general.log_level);
    let filter = EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("podrag={}", level)),
    );

    let log_dir = settings.log_dir();
    let log_path = log_dir.join(LOG_FILE_NAME);
    let opened = std::fs::create_dir_all(&log_dir).and_then(|_| {
        OpenOptions::new().create(true).append(true).open(&log_path)
    });

    let (file_layer, run_log, open_error) = match opened {
        Ok(file) => {
            let start_offset = file.metadata().map(|m| m.len()).unwrap_or(0);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (
                Some(layer),
                RunLog { path: Some(log_path), start_offset },
                None,
            )
        }
        Err(e) => (None, RunLog { path: None, start_offset: 0 }, Some(e)),
    };

    let init_result = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .try_init();

    if let Err(e) = init_result {
        debug!("Tracing subscriber already installed: {}", e);
    }
    if let Some(e) = open_error {
        warn!("Run log disabled: {}", e);
    }

    run_log
}

/// Object key for a day's archived log: `<prefix><MM-DD-YYYY>/current_rag_log.log`.
pub fn archive_key(prefix: &str, day: NaiveDate) -> String {
    format!("{}{}/{}", prefix, day.format("%m-%d-%Y"), ARCHIVE_FILE_NAME)
}

/// Append this run's log to today's archive object.
///
/// Archiving is best effort: every failure is logged and swallowed.
pub async fn archive_log(settings: &Settings, run_log: &RunLog) {
    let Some(prefix) = settings.logging.archive_prefix.as_deref() else {
        return;
    };
    if settings.storage.bucket.is_none() {
        debug!("Log archiving configured without a bucket; skipping");
        return;
    }

    let content = match run_log.read_current() {
        Ok(Some(content)) if !content.is_empty() => content,
        Ok(_) => return,
        Err(e) => {
            warn!("Could not read run log for archiving: {}", e);
            return;
        }
    };

    let gateway = match ObjectStoreGateway::from_settings(settings) {
        Ok(gateway) => gateway,
        Err(e) => {
            warn!("Log archive upload failed: {}", e);
            return;
        }
    };

    if let Err(e) = append_archive(&gateway, prefix, Local::now().date_naive(), &content).await {
        warn!("Log archive upload failed: {}", e);
    }
}

async fn append_archive(
    gateway: &ObjectStoreGateway,
    prefix: &str,
    day: NaiveDate,
    content: &str,
) -> Result<String> {
    let key = archive_key(prefix, day);
    let written = gateway.append_string(&key, content).await?;
    info!("Archived run log to {}", written);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_level() {
        assert_eq!(effective_level(0, "warn"), "warn");
        assert_eq!(effective_level(1, "warn"), "debug");
        assert_eq!(effective_level(3, "info"), "trace");
    }

    #[test]
    fn test_archive_key() {
        let day = NaiveDate::from_ymd_opt(2025, 2, 7).unwrap();
        assert_eq!(archive_key("rag-logs/", day), "rag-logs/02-07-2025/current_rag_log.log");
    }

    #[test]
    fn test_run_log_reads_only_current_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        std::fs::write(&path, "previous run\n").unwrap();

        let run_log = RunLog { path: Some(path.clone()), start_offset: 13 };
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        std::io::Write::write_all(&mut file, b"this run\n").unwrap();

        assert_eq!(run_log.read_current().unwrap().unwrap(), "this run\n");
        assert!(RunLog { path: None, start_offset: 0 }.read_current().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_archive_accumulates() {
        let gateway = ObjectStoreGateway::in_memory("bucket");
        let day = NaiveDate::from_ymd_opt(2025, 2, 7).unwrap();

        append_archive(&gateway, "logs/", day, "one\n").await.unwrap();
        let key = append_archive(&gateway, "logs/", day, "two\n").await.unwrap();

        assert_eq!(key, "logs/02-07-2025/current_rag_log.log");
        assert_eq!(gateway.read_to_string(&key).await.unwrap(), "one\ntwo\n");
    }
}
