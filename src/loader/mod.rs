//! Transcript loading.
//!
//! Reads the `.txt` transcript files (JSON content) in the data directory into documents.
//! Ingestion is best-effort: bad records are skipped and reported, never fatal.

mod record;

pub use record::{parse_records, RecordOutcome, SkipReason};

use crate::error::{PodragError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use walkdir::WalkDir;

/// Episode metadata carried by every document and chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetadata {
    pub episode_name: String,
    pub podcast_name: String,
    pub episode_link: String,
    /// Duration as published (seconds or a clock string).
    pub duration: Option<String>,
    /// File the record was read from.
    pub source: String,
}

/// One transcript record.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub text: String,
    pub metadata: EpisodeMetadata,
}

/// A record that was not loaded.
#[derive(Debug, Clone)]
pub struct SkippedRecord {
    pub file: PathBuf,
    pub line: Option<usize>,
    pub reason: SkipReason,
}

/// Result of loading a directory.
#[derive(Debug, Default)]
pub struct IngestionReport {
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedRecord>,
    pub files_scanned: usize,
}

/// Whether a path looks like a transcript file.
pub fn is_transcript_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("txt"))
        .unwrap_or(false)
}

/// Load every transcript file directly inside `dir`.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_directory(dir: &Path) -> Result<IngestionReport> {
    if !dir.is_dir() {
        return Err(PodragError::Config(format!(
            "Transcript directory not found: {}",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_transcript_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();

    let mut report = IngestionReport::default();

    for path in files {
        report.files_scanned += 1;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let outcomes = match std::fs::read_to_string(&path) {
            Ok(content) => parse_records(&content, &source),
            Err(e) => vec![RecordOutcome::Skipped {
                line: None,
                reason: SkipReason::Unreadable(e.to_string()),
            }],
        };

        for outcome in outcomes {
            match outcome {
                RecordOutcome::Loaded(doc) => report.documents.push(doc),
                RecordOutcome::Skipped { line, reason } => {
                    match line {
                        Some(n) => warn!("Skipping {} line {}: {}", source, n, reason),
                        None => warn!("Skipping record in {}: {}", source, reason),
                    }
                    report.skipped.push(SkippedRecord {
                        file: path.clone(),
                        line,
                        reason,
                    });
                }
            }
        }
    }

    info!(
        "Loaded {} documents from {} files ({} records skipped)",
        report.documents.len(),
        report.files_scanned,
        report.skipped.len()
    );

    Ok(report)
}
