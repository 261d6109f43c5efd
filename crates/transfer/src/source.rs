use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::TransferError;

/// MIME type sent when the extension is unknown.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A local file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSource {
    path: PathBuf,
    filename: String,
    mime_type: String,
    size: u64,
    modified_ms: Option<i64>,
}

impl UploadSource {
    /// Describes the file at `path`, reading its size and modification time.
    pub fn from_path(path: &Path) -> Result<Self, TransferError> {
        let meta = std::fs::metadata(path)?;
        if !meta.is_file() {
            return Err(TransferError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            )));
        }

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = detect_content_type(&filename)
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();
        let modified_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64);

        Ok(Self {
            path: path.to_path_buf(),
            filename,
            mime_type,
            size: meta.len(),
            modified_ms,
        })
    }

    /// Overrides the name announced to the server.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_modified_ms(mut self, modified_ms: Option<i64>) -> Self {
        self.modified_ms = modified_ms;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Modification time in milliseconds since the Unix epoch.
    pub fn modified_ms(&self) -> Option<i64> {
        self.modified_ms
    }

    /// tus `Upload-Metadata` pairs for this file.
    pub fn metadata(&self) -> Vec<(String, String)> {
        vec![
            ("filename".to_string(), self.filename.clone()),
            ("filetype".to_string(), self.mime_type.clone()),
        ]
    }
}

/// Detects MIME content type from a file path extension.
pub fn detect_content_type(path: &str) -> Option<&'static str> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("webp") => Some("image/webp"),
        Some("gif") => Some("image/gif"),
        Some("svg") => Some("image/svg+xml"),
        Some("ico") => Some("image/x-icon"),
        Some("pdf") => Some("application/pdf"),
        Some("zip") => Some("application/zip"),
        Some("gz" | "tgz") => Some("application/gzip"),
        Some("7z") => Some("application/x-7z-compressed"),
        Some("json") => Some("application/json"),
        Some("doc") => Some("application/msword"),
        Some("docx") => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        Some("xlsx") => Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        Some("pptx") => {
            Some("application/vnd.openxmlformats-officedocument.presentationml.presentation")
        }
        Some("txt" | "log") => Some("text/plain"),
        Some("md") => Some("text/markdown"),
        Some("csv") => Some("text/csv"),
        Some("html" | "htm") => Some("text/html"),
        Some("mp3") => Some("audio/mpeg"),
        Some("wav") => Some("audio/wav"),
        Some("mp4") => Some("video/mp4"),
        Some("mov") => Some("video/quicktime"),
        Some("webm") => Some("video/webm"),
        _ => None,
    }
}
