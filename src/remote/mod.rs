//! Object store gateway.
//!
//! Transcripts are staged in a bucket under dated folders (`MM-DD-YYYY`) and
//! synchronised into the local data directory; run logs are archived back to it.

mod sync;

pub use sync::{safe_file_name, sync_flat, SyncReport};

use crate::config::Settings;
use crate::error::{PodragError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// Date format of the bucket's folder names.
pub const FOLDER_DATE_FORMAT: &str = "%m-%d-%Y";

/// An object listed from the bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    /// Full object key.
    pub key: String,
    /// Last path segment of the key.
    pub name: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Outcome of a folder upload.
#[derive(Debug, Clone, Default)]
pub struct UploadReport {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Access to one bucket, optionally scoped under a key prefix.
pub struct ObjectStoreGateway {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    prefix: Option<String>,
}

impl ObjectStoreGateway {
    /// Wrap an existing object store.
    pub fn new(store: Arc<dyn ObjectStore>, bucket: &str) -> Self {
        Self {
            store,
            bucket: bucket.to_string(),
            prefix: None,
        }
    }

    /// Connect to the configured S3 bucket.
    ///
    /// Credentials come from the standard AWS environment variables.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let bucket = settings.require_bucket()?;
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(&settings.storage.region)
            .build()?;

        info!("Connected to bucket {} in {}", bucket, settings.storage.region);
        Ok(Self::new(Arc::new(store), bucket))
    }

    /// A gateway over a fresh in-memory store.
    pub fn in_memory(bucket: &str) -> Self {
        Self::new(Arc::new(InMemory::new()), bucket)
    }

    /// Scope every write and read key under `prefix`.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        let trimmed = prefix.trim_matches('/');
        self.prefix = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Join `key` under the gateway prefix, collapsing duplicate slashes.
    fn full_key(&self, key: &str) -> ObjectPath {
        let joined = self
            .prefix
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(key))
            .flat_map(|part| part.split('/'))
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        ObjectPath::from(joined)
    }

    fn list_prefix(&self, prefix: &str) -> Option<ObjectPath> {
        let path = self.full_key(prefix);
        (!path.as_ref().is_empty()).then_some(path)
    }

    /// List objects under `prefix`, optionally filtered by a case-insensitive
    /// suffix and capped at `max_files`.
    #[instrument(skip(self))]
    pub async fn list_files(
        &self,
        prefix: &str,
        suffix: Option<&str>,
        max_files: Option<usize>,
    ) -> Result<Vec<RemoteFile>> {
        let list_prefix = self.list_prefix(prefix);
        let mut objects: Vec<_> = self.store.list(list_prefix.as_ref()).try_collect().await?;
        objects.sort_by(|a, b| a.location.as_ref().cmp(b.location.as_ref()));

        let suffix = suffix.map(str::to_lowercase);
        let mut files = Vec::new();

        for meta in objects {
            let key = meta.location.to_string();
            if key.ends_with('/') {
                continue;
            }
            let Some(name) = meta.location.filename().map(str::to_string) else {
                continue;
            };
            if let Some(suffix) = &suffix {
                if !key.to_lowercase().ends_with(suffix.as_str()) {
                    continue;
                }
            }

            files.push(RemoteFile {
                key,
                name,
                size: meta.size as u64,
                last_modified: meta.last_modified,
            });

            if max_files.is_some_and(|max| files.len() >= max) {
                break;
            }
        }

        debug!("Listed {} files", files.len());
        Ok(files)
    }

    /// Names of the immediate sub-folders of `prefix`.
    ///
    /// When there are none, the names of the objects directly under it are returned.
    #[instrument(skip(self))]
    pub async fn list_folders(&self, prefix: &str) -> Result<Vec<String>> {
        let list_prefix = self.list_prefix(prefix);
        let listing = self.store.list_with_delimiter(list_prefix.as_ref()).await?;

        let folders: Vec<String> = listing
            .common_prefixes
            .iter()
            .filter_map(|p| p.filename().map(str::to_string))
            .collect();

        if !folders.is_empty() {
            return Ok(folders);
        }

        Ok(listing
            .objects
            .iter()
            .filter_map(|meta| meta.location.filename().map(str::to_string))
            .collect())
    }

    /// Dated folders under `prefix` that are strictly newer than `cutoff`.
    pub async fn folders_after_cutoff(&self, prefix: &str, cutoff: NaiveDate) -> Result<Vec<String>> {
        let folders = self.list_folders(prefix).await?;
        Ok(filter_dates_after_cutoff(&folders, cutoff))
    }

    /// Fetch an object's raw bytes.
    pub async fn read_bytes(&self, key: &str) -> Result<Vec<u8>> {
        let result = self.store.get(&self.full_key(key)).await?;
        let bytes = result.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Fetch an object as UTF-8 text.
    pub async fn read_to_string(&self, key: &str) -> Result<String> {
        let bytes = self.read_bytes(key).await?;
        String::from_utf8(bytes)
            .map_err(|e| PodragError::InvalidInput(format!("Object {} is not UTF-8: {}", key, e)))
    }

    /// Store `content` at `key`, returning the full key written.
    #[instrument(skip(self, content))]
    pub async fn upload_string(&self, key: &str, content: &str) -> Result<String> {
        self.upload_bytes(key, content.as_bytes().to_vec()).await
    }

    async fn upload_bytes(&self, key: &str, content: Vec<u8>) -> Result<String> {
        let path = self.full_key(key);
        self.store.put(&path, PutPayload::from(content)).await?;
        info!("Uploaded s3://{}/{}", self.bucket, path);
        Ok(path.to_string())
    }

    /// Upload a local file, keyed by its file name unless `key` is given.
    pub async fn upload_file(&self, file: &Path, key: Option<&str>) -> Result<String> {
        let key = match key {
            Some(k) => k.to_string(),
            None => file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| {
                    PodragError::InvalidInput(format!("Not a file path: {}", file.display()))
                })?,
        };
        let content = tokio::fs::read(file).await?;
        self.upload_bytes(&key, content).await
    }

    /// Upload every file below `folder`, keeping relative paths under `subfolder`.
    #[instrument(skip(self))]
    pub async fn upload_folder(&self, folder: &Path, subfolder: Option<&str>) -> Result<UploadReport> {
        if !folder.is_dir() {
            return Err(PodragError::InvalidInput(format!(
                "Folder not found: {}",
                folder.display()
            )));
        }

        let mut report = UploadReport::default();
        let files = WalkDir::new(folder)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file());

        for entry in files {
            let relative = entry
                .path()
                .strip_prefix(folder)
                .unwrap_or(entry.path())
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join("/");
            let key = match subfolder {
                Some(sub) => format!("{}/{}", sub, relative),
                None => relative.clone(),
            };

            match self.upload_file(entry.path(), Some(&key)).await {
                Ok(_) => report.success += 1,
                Err(e) => {
                    warn!("Failed to upload {}: {}", relative, e);
                    report.failed += 1;
                    report.errors.push(format!("Failed to upload: {}", relative));
                }
            }
        }

        Ok(report)
    }

    /// Append `text` to the object at `key`, creating it when missing.
    pub async fn append_string(&self, key: &str, text: &str) -> Result<String> {
        let mut content = match self.read_to_string(key).await {
            Ok(existing) => existing,
            Err(PodragError::ObjectStore(object_store::Error::NotFound { .. })) => String::new(),
            Err(e) => return Err(e),
        };
        content.push_str(text);
        self.upload_string(key, &content).await
    }
}

/// Keep folder names that parse as `MM-DD-YYYY` dates strictly after `cutoff`.
pub fn filter_dates_after_cutoff(folders: &[String], cutoff: NaiveDate) -> Vec<String> {
    folders
        .iter()
        .filter(|name| match NaiveDate::parse_from_str(name, FOLDER_DATE_FORMAT) {
            Ok(date) => date > cutoff,
            Err(_) => {
                warn!("Skipping folder with unexpected name: {}", name);
                false
            }
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_full_key_normalises_slashes() {
        let gateway = ObjectStoreGateway::in_memory("bucket").with_prefix("/logs/rag/");
        assert_eq!(gateway.full_key("/01-02-2025//run.log").as_ref(), "logs/rag/01-02-2025/run.log");

        let gateway = ObjectStoreGateway::in_memory("bucket");
        assert_eq!(gateway.full_key("a/b.txt").as_ref(), "a/b.txt");
    }

    #[test]
    fn test_filter_dates_after_cutoff() {
        let folders = vec![
            "01-01-2025".to_string(),
            "01-02-2025".to_string(),
            "12-31-2024".to_string(),
            "not-a-date".to_string(),
        ];
        assert_eq!(filter_dates_after_cutoff(&folders, date(2025, 1, 1)), vec!["01-02-2025"]);
    }

    #[tokio::test]
    async fn test_list_files_filters() {
        let gateway = ObjectStoreGateway::in_memory("bucket");
        gateway.upload_string("transcriptions/01-02-2025/a.txt", "a").await.unwrap();
        gateway.upload_string("transcriptions/01-02-2025/b.TXT", "b").await.unwrap();
        gateway.upload_string("transcriptions/01-02-2025/c.json", "c").await.unwrap();
        gateway.upload_string("other/d.txt", "d").await.unwrap();

        let all = gateway.list_files("transcriptions", None, None).await.unwrap();
        assert_eq!(all.len(), 3);

        let txt = gateway.list_files("/transcriptions/", Some(".txt"), None).await.unwrap();
        let names: Vec<&str> = txt.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.TXT"]);
        assert_eq!(txt[0].key, "transcriptions/01-02-2025/a.txt");
        assert_eq!(txt[0].size, 1);

        let capped = gateway.list_files("transcriptions", None, Some(1)).await.unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn test_folders_after_cutoff() {
        let gateway = ObjectStoreGateway::in_memory("bucket");
        for folder in ["12-30-2024", "01-05-2025", "02-01-2025"] {
            gateway
                .upload_string(&format!("transcriptions/{}/x.txt", folder), "x")
                .await
                .unwrap();
        }

        let mut folders = gateway.list_folders("transcriptions").await.unwrap();
        folders.sort();
        assert_eq!(folders, vec!["01-05-2025", "02-01-2025", "12-30-2024"]);

        let mut newer = gateway
            .folders_after_cutoff("transcriptions", date(2025, 1, 5))
            .await
            .unwrap();
        newer.sort();
        assert_eq!(newer, vec!["02-01-2025"]);
    }

    #[tokio::test]
    async fn test_list_folders_falls_back_to_objects() {
        let gateway = ObjectStoreGateway::in_memory("bucket");
        gateway.upload_string("flat/one.txt", "1").await.unwrap();

        assert_eq!(gateway.list_folders("flat").await.unwrap(), vec!["one.txt"]);
    }

    #[tokio::test]
    async fn test_append_string() {
        let gateway = ObjectStoreGateway::in_memory("bucket").with_prefix("logs");

        let key = gateway.append_string("run.log", "first\n").await.unwrap();
        assert_eq!(key, "logs/run.log");
        gateway.append_string("run.log", "second\n").await.unwrap();

        assert_eq!(gateway.read_to_string("run.log").await.unwrap(), "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_read_missing_object() {
        let gateway = ObjectStoreGateway::in_memory("bucket");
        let err = gateway.read_to_string("missing.txt").await.unwrap_err();
        assert!(matches!(err, PodragError::ObjectStore(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_upload_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        std::fs::write(dir.path().join("nested").join("b.txt"), "b").unwrap();

        let gateway = ObjectStoreGateway::in_memory("bucket");
        let report = gateway.upload_folder(dir.path(), Some("backup")).await.unwrap();

        assert_eq!(report.success, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(gateway.read_to_string("backup/nested/b.txt").await.unwrap(), "b");
        assert_eq!(gateway.read_to_string("backup/a.txt").await.unwrap(), "a");

        assert!(gateway.upload_folder(&dir.path().join("missing"), None).await.is_err());
    }
}
