//! Resume records for interrupted uploads.
//!
//! When the server creates an upload, the client remembers its URL under
//! the file's fingerprint. Selecting the same file again finds the record
//! and continues the upload instead of starting over.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::TransferError;

/// A previously created upload that may be resumable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousUpload {
    pub fingerprint: String,
    pub upload_url: String,
    pub size: u64,
    #[serde(default)]
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

/// Storage port for resume records.
pub trait ResumeStore: Send + Sync {
    /// Records matching `fingerprint`, oldest first.
    fn find(&self, fingerprint: &str) -> Result<Vec<PreviousUpload>, TransferError>;

    fn add(&self, upload: PreviousUpload) -> Result<(), TransferError>;

    /// Removes the record for `upload_url` under `fingerprint`, if present.
    fn remove(&self, fingerprint: &str, upload_url: &str) -> Result<(), TransferError>;

    /// All records, oldest first.
    fn list(&self) -> Result<Vec<PreviousUpload>, TransferError>;
}

/// In-process store, for tests and one-shot runs.
#[derive(Default)]
pub struct MemoryResumeStore {
    records: RwLock<Vec<PreviousUpload>>,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResumeStore for MemoryResumeStore {
    fn find(&self, fingerprint: &str) -> Result<Vec<PreviousUpload>, TransferError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(matching(&records, fingerprint))
    }

    fn add(&self, upload: PreviousUpload) -> Result<(), TransferError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        upsert(&mut records, upload);
        Ok(())
    }

    fn remove(&self, fingerprint: &str, upload_url: &str) -> Result<(), TransferError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.retain(|r| !(r.fingerprint == fingerprint && r.upload_url == upload_url));
        Ok(())
    }

    fn list(&self) -> Result<Vec<PreviousUpload>, TransferError> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

/// Resume records cached in memory and persisted to a JSON file.
pub struct FileResumeStore {
    path: PathBuf,
    records: RwLock<Vec<PreviousUpload>>,
}

impl FileResumeStore {
    /// Opens the store, loading existing records from disk.
    pub fn new(path: PathBuf) -> Result<Self, TransferError> {
        let records = load_records(&path)?;
        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current records to disk.
    fn persist(&self, records: &[PreviousUpload]) -> Result<(), TransferError> {
        let json = serde_json::to_string_pretty(records)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        debug!("persisted {} resume record(s) to {:?}", records.len(), self.path);
        Ok(())
    }
}

impl ResumeStore for FileResumeStore {
    fn find(&self, fingerprint: &str) -> Result<Vec<PreviousUpload>, TransferError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(matching(&records, fingerprint))
    }

    fn add(&self, upload: PreviousUpload) -> Result<(), TransferError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        upsert(&mut records, upload);
        self.persist(&records)
    }

    fn remove(&self, fingerprint: &str, upload_url: &str) -> Result<(), TransferError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let before = records.len();
        records.retain(|r| !(r.fingerprint == fingerprint && r.upload_url == upload_url));
        if records.len() == before {
            return Ok(());
        }
        self.persist(&records)
    }

    fn list(&self) -> Result<Vec<PreviousUpload>, TransferError> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

fn matching(records: &[PreviousUpload], fingerprint: &str) -> Vec<PreviousUpload> {
    records
        .iter()
        .filter(|r| r.fingerprint == fingerprint)
        .cloned()
        .collect()
}

/// Replaces a record with the same URL, or appends.
fn upsert(records: &mut Vec<PreviousUpload>, upload: PreviousUpload) {
    match records.iter_mut().find(|r| r.upload_url == upload.upload_url) {
        Some(existing) => *existing = upload,
        None => records.push(upload),
    }
}

/// Loads records from a JSON file on disk.
///
/// A corrupt file is logged and treated as empty; the next write replaces it.
fn load_records(path: &Path) -> Result<Vec<PreviousUpload>, TransferError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Vec<PreviousUpload>>(&data) {
        Ok(records) => {
            debug!("loaded {} resume record(s) from {:?}", records.len(), path);
            Ok(records)
        }
        Err(e) => {
            warn!("ignoring corrupt resume records at {:?}: {e}", path);
            Ok(Vec::new())
        }
    }
}

/// Returns the default resume store path under `config_dir`.
pub fn default_resume_path(config_dir: &Path) -> PathBuf {
    config_dir.join("ahavault").join("uploads.json")
}
