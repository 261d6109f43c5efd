//! Resumable file uploads over the tus 1.0.0 protocol.
//!
//! An [`Uploader`] turns a local file into an [`UploadHandle`] whose event
//! stream reports progress, success or failure. Interrupted uploads are
//! remembered in a [`ResumeStore`] and continued from the server's offset
//! on the next attempt.

mod chunked;
mod progress;
mod resume;
mod retry;
mod source;
mod tus;
mod types;
mod uploader;

pub use chunked::{FINGERPRINT_SAMPLE_LEN, fingerprint, read_chunk_at};
pub use progress::ThroughputMeter;
pub use resume::{
    FileResumeStore, MemoryResumeStore, PreviousUpload, ResumeStore, default_resume_path,
};
pub use retry::RetryPolicy;
pub use source::{UploadSource, detect_content_type};
pub use tus::{HttpTusTransport, TusFuture, TusTransport, encode_metadata};
pub use types::{Chunk, UploadEvent, UploadProgress, UploadSession, UploadStatus};
pub use uploader::{UploadHandle, Uploader};

/// Default chunk size: 4 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("offset mismatch: expected {expected}, server reported {actual}")]
    OffsetMismatch { expected: u64, actual: u64 },

    #[error("invalid bearer token")]
    InvalidToken,

    #[error("cancelled")]
    Cancelled,
}

impl TransferError {
    /// Whether another attempt may succeed.
    ///
    /// Client errors (4xx) are final except 409 Conflict and 423 Locked.
    /// Local I/O and protocol violations are final too.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => is_retryable_status(*status),
            Self::Http(e) => e.status().is_none_or(|s| is_retryable_status(s.as_u16())),
            Self::OffsetMismatch { .. } => true,
            Self::Io(_)
            | Self::Json(_)
            | Self::Protocol(_)
            | Self::InvalidToken
            | Self::Cancelled => false,
        }
    }
}

fn is_retryable_status(status: u16) -> bool {
    !(400..500).contains(&status) || status == 409 || status == 423
}
