//! Flat synchronisation of bucket transcripts into the local data directory.

use super::{ObjectStoreGateway, RemoteFile};
use crate::error::Result;
use crate::loader::is_transcript_file;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

const MAX_FILE_NAME_LEN: usize = 255;

/// Outcome of a sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Local paths written.
    pub downloaded: Vec<PathBuf>,
    /// Remote objects whose name already exists locally.
    pub skipped_existing: usize,
    /// `(key, error)` for downloads that failed.
    pub failed: Vec<(String, String)>,
}

/// Make a remote object name safe to use as a local file name.
///
/// Drops characters that are invalid on common file systems, replaces spaces
/// with underscores, lowercases, and caps the length.
pub fn safe_file_name(name: &str) -> String {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    let invalid = INVALID.get_or_init(|| Regex::new(r#"[\\/:"*?<>|]"#).expect("Invalid regex"));

    invalid
        .replace_all(name, "")
        .replace(' ', "_")
        .to_lowercase()
        .chars()
        .take(MAX_FILE_NAME_LEN)
        .collect()
}

/// Transcript file names already present anywhere below `dir`.
fn existing_names(dir: &Path) -> HashSet<String> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_transcript_file(e.path()))
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect()
}

/// Keep the most recently modified object per local file name.
///
/// An object counts as present when a local file carries either its bucket name
/// or its sanitised name.
fn latest_by_name(files: Vec<RemoteFile>, existing: &HashSet<String>) -> (BTreeMap<String, RemoteFile>, usize) {
    let mut latest: BTreeMap<String, RemoteFile> = BTreeMap::new();
    let mut skipped = 0;

    for file in files {
        let local_name = safe_file_name(&file.name);
        if existing.contains(&file.name) || existing.contains(&local_name) {
            skipped += 1;
            continue;
        }
        match latest.get(&local_name) {
            Some(current) if current.last_modified >= file.last_modified => {}
            _ => {
                latest.insert(local_name, file);
            }
        }
    }

    (latest, skipped)
}

/// Download every object under `prefix` into `local_dir`, flattening the
/// folder structure.
///
/// Names already present below `local_dir` are left alone. When several objects
/// share a name, only the newest is downloaded.
#[instrument(skip(gateway), fields(bucket = %gateway.bucket()))]
pub async fn sync_flat(gateway: &ObjectStoreGateway, prefix: &str, local_dir: &Path) -> Result<SyncReport> {
    std::fs::create_dir_all(local_dir)?;

    let existing = existing_names(local_dir);
    let files = gateway.list_files(prefix, None, None).await?;
    let (latest, skipped_existing) = latest_by_name(files, &existing);

    let mut report = SyncReport {
        skipped_existing,
        ..Default::default()
    };

    for (local_name, file) in latest {
        let target = local_dir.join(&local_name);
        debug!("Downloading {} as {:?}", file.key, target);

        match download(gateway, &file.key, local_dir, &target).await {
            Ok(()) => report.downloaded.push(target),
            Err(e) => {
                warn!("Failed to download {}: {}", file.key, e);
                report.failed.push((file.key, e.to_string()));
            }
        }
    }

    info!(
        "Sync complete: {} downloaded, {} already present, {} failed",
        report.downloaded.len(),
        report.skipped_existing,
        report.failed.len()
    );
    Ok(report)
}

/// Write through a temp file in the target directory so a failed download never
/// leaves a partial transcript behind.
async fn download(gateway: &ObjectStoreGateway, key: &str, dir: &Path, target: &Path) -> Result<()> {
    let bytes = gateway.read_bytes(key).await?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(&bytes)?;
    temp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
