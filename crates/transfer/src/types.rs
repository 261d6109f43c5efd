use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::time::Instant;

use ahavault_protocol::percent;

use crate::progress::ThroughputMeter;

/// A slice of file data at a known offset.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Byte offset within the file.
    pub offset: u64,
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Offset just past this chunk.
    pub fn end(&self) -> u64 {
        self.offset + self.data.len() as u64
    }
}

/// Events emitted by a running upload, in order, on a single channel.
///
/// At most one terminal event (`Success` or `Failure`) is sent, and nothing
/// follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// The server acknowledged data up to `bytes_sent`.
    Progress { bytes_sent: u64, bytes_total: u64 },
    Success,
    /// The upload stopped for good; carries a human-readable reason.
    Failure(String),
}

/// Lifecycle of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

/// Point-in-time view of an [`UploadSession`].
#[derive(Debug, Clone, PartialEq)]
pub struct UploadProgress {
    pub filename: String,
    pub status: UploadStatus,
    pub total_bytes: u64,
    pub transferred_bytes: u64,
    /// Rounded completion in `0..=100`.
    pub percent: u8,
    pub bytes_per_second: f64,
    pub eta: Option<Duration>,
    pub upload_url: Option<String>,
    pub error: Option<String>,
}

/// Tracks one upload (thread-safe).
pub struct UploadSession {
    inner: RwLock<SessionInner>,
    meter: ThroughputMeter,
}

struct SessionInner {
    filename: String,
    status: UploadStatus,
    total_bytes: u64,
    transferred_bytes: u64,
    upload_url: Option<String>,
    started_at: Option<Instant>,
    completed_at: Option<Instant>,
    error: Option<String>,
}

impl UploadSession {
    /// Creates a new pending upload session.
    pub fn new(filename: impl Into<String>, total_bytes: u64) -> Self {
        Self {
            inner: RwLock::new(SessionInner {
                filename: filename.into(),
                status: UploadStatus::Pending,
                total_bytes,
                transferred_bytes: 0,
                upload_url: None,
                started_at: None,
                completed_at: None,
                error: None,
            }),
            meter: ThroughputMeter::default(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks the session as in-progress.
    pub fn start(&self) {
        let offset = {
            let mut s = self.write();
            s.status = UploadStatus::InProgress;
            s.started_at = Some(Instant::now());
            s.transferred_bytes
        };
        self.meter.restart_at(offset);
    }

    /// Records the server-side upload URL once known.
    pub fn set_upload_url(&self, url: &str) {
        self.write().upload_url = Some(url.to_string());
    }

    /// Moves the acknowledged offset to `offset`.
    ///
    /// `acknowledged` is true for offsets reached by sending data; offsets
    /// learned from a probe restart the rate measurement instead.
    pub fn set_offset(&self, offset: u64, acknowledged: bool) {
        self.write().transferred_bytes = offset;
        if acknowledged {
            self.meter.record(offset);
        } else {
            self.meter.restart_at(offset);
        }
    }

    /// Marks the session as completed.
    pub fn complete(&self) -> bool {
        let Some(mut s) = self.finish(UploadStatus::Completed) else {
            return false;
        };
        s.transferred_bytes = s.total_bytes;
        true
    }

    /// Marks the session as failed with an error message.
    pub fn fail(&self, err: &str) -> bool {
        let Some(mut s) = self.finish(UploadStatus::Failed) else {
            return false;
        };
        s.error = Some(err.to_string());
        true
    }

    /// Marks the session as cancelled.
    pub fn cancel(&self) -> bool {
        self.finish(UploadStatus::Cancelled).is_some()
    }

    /// Moves a running session to a final status. A session that already
    /// finished keeps its status and `None` is returned.
    fn finish(&self, status: UploadStatus) -> Option<RwLockWriteGuard<'_, SessionInner>> {
        let mut s = self.write();
        if !matches!(s.status, UploadStatus::Pending | UploadStatus::InProgress) {
            return None;
        }
        s.status = status;
        s.completed_at = Some(Instant::now());
        Some(s)
    }

    /// Returns a snapshot of the session.
    pub fn progress(&self) -> UploadProgress {
        let s = self.read();
        let remaining = s.total_bytes.saturating_sub(s.transferred_bytes);
        UploadProgress {
            filename: s.filename.clone(),
            status: s.status,
            total_bytes: s.total_bytes,
            transferred_bytes: s.transferred_bytes,
            percent: percent(s.transferred_bytes, s.total_bytes),
            bytes_per_second: self.meter.bytes_per_second(),
            eta: self.meter.eta(remaining),
            upload_url: s.upload_url.clone(),
            error: s.error.clone(),
        }
    }

    /// Returns `true` if the session is pending or in-progress.
    pub fn is_active(&self) -> bool {
        matches!(
            self.read().status,
            UploadStatus::Pending | UploadStatus::InProgress
        )
    }

    pub fn status(&self) -> UploadStatus {
        self.read().status
    }

    pub fn filename(&self) -> String {
        self.read().filename.clone()
    }

    pub fn total_bytes(&self) -> u64 {
        self.read().total_bytes
    }

    pub fn transferred_bytes(&self) -> u64 {
        self.read().transferred_bytes
    }

    /// Wall time between start and completion (or now, while running).
    pub fn elapsed(&self) -> Option<Duration> {
        let s = self.read();
        let started = s.started_at?;
        Some(s.completed_at.unwrap_or_else(Instant::now) - started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_pending() {
        let session = UploadSession::new("a.bin", 1024);
        assert_eq!(session.status(), UploadStatus::Pending);
        assert!(session.is_active());
        assert_eq!(session.transferred_bytes(), 0);
        assert!(session.elapsed().is_none());
    }

    #[test]
    fn start_sets_in_progress() {
        let session = UploadSession::new("a.bin", 1024);
        session.start();
        assert_eq!(session.status(), UploadStatus::InProgress);
        assert!(session.is_active());
        assert!(session.elapsed().is_some());
    }

    #[test]
    fn offsets_drive_percent() {
        let session = UploadSession::new("a.bin", 1000);
        session.start();
        session.set_offset(500, true);
        let p = session.progress();
        assert_eq!(p.transferred_bytes, 500);
        assert_eq!(p.percent, 50);
    }

    #[test]
    fn complete_fills_transferred() {
        let session = UploadSession::new("a.bin", 1024);
        session.start();
        session.complete();
        assert_eq!(session.status(), UploadStatus::Completed);
        assert_eq!(session.transferred_bytes(), 1024);
        assert!(!session.is_active());
    }

    #[test]
    fn fail_records_error() {
        let session = UploadSession::new("a.bin", 1024);
        session.start();
        session.fail("disk full");
        assert_eq!(session.status(), UploadStatus::Failed);
        assert!(!session.is_active());
        assert_eq!(session.progress().error.as_deref(), Some("disk full"));
    }

    #[test]
    fn cancel_does_not_override_completion() {
        let session = UploadSession::new("a.bin", 1024);
        session.start();
        assert!(session.complete());
        assert!(!session.cancel());
        assert_eq!(session.status(), UploadStatus::Completed);

        let other = UploadSession::new("b.bin", 1024);
        other.start();
        assert!(other.cancel());
        assert_eq!(other.status(), UploadStatus::Cancelled);
    }

    #[test]
    fn final_status_is_sticky() {
        let cancelled = UploadSession::new("a.bin", 1024);
        cancelled.start();
        cancelled.set_offset(512, true);
        cancelled.cancel();
        assert!(!cancelled.complete());
        assert!(!cancelled.fail("late error"));
        let snapshot = cancelled.progress();
        assert_eq!(snapshot.status, UploadStatus::Cancelled);
        assert_eq!(snapshot.transferred_bytes, 512);
        assert_eq!(snapshot.error, None);

        let failed = UploadSession::new("b.bin", 1024);
        failed.start();
        failed.fail("disk full");
        assert!(!failed.complete());
        assert_eq!(failed.status(), UploadStatus::Failed);
    }

    #[test]
    fn upload_url_in_snapshot() {
        let session = UploadSession::new("a.bin", 10);
        session.set_upload_url("http://h/api/tus/upload/abc");
        assert_eq!(
            session.progress().upload_url.as_deref(),
            Some("http://h/api/tus/upload/abc")
        );
    }

    #[test]
    fn chunk_helpers() {
        let chunk = Chunk {
            offset: 8,
            data: vec![1, 2],
        };
        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk.end(), 10);
        assert!(!chunk.is_empty());
    }

    #[test]
    fn concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let session = Arc::new(UploadSession::new("a.bin", 100_000));
        session.start();

        let mut handles = vec![];
        for i in 0..10u64 {
            let s = Arc::clone(&session);
            handles.push(thread::spawn(move || {
                for j in 0..100u64 {
                    s.set_offset(i * 100 + j, false);
                    let _ = s.progress();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert!(session.is_active());
    }
}
