//! Upload orchestration: resume lookup, chunked PATCH loop, retries and
//! cancellation.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::chunked::{fingerprint, read_chunk_at};
use crate::resume::{PreviousUpload, ResumeStore};
use crate::retry::RetryPolicy;
use crate::source::UploadSource;
use crate::tus::TusTransport;
use crate::types::{UploadEvent, UploadSession};
use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// Capacity of the per-upload event channel.
const EVENT_BUFFER: usize = 64;

/// Starts resumable uploads against one tus endpoint.
pub struct Uploader {
    transport: Arc<dyn TusTransport>,
    resume: Arc<dyn ResumeStore>,
    chunk_size: usize,
    retry: RetryPolicy,
}

impl Uploader {
    pub fn new(transport: Arc<dyn TusTransport>, resume: Arc<dyn ResumeStore>) -> Self {
        Self {
            transport,
            resume,
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry: RetryPolicy::default(),
        }
    }

    /// Sets the PATCH body size. 0 selects [`DEFAULT_CHUNK_SIZE`].
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Begins uploading `source` in a background task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, source: UploadSource) -> UploadHandle {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let cancel = CancellationToken::new();
        let session = Arc::new(UploadSession::new(source.filename(), source.size()));

        let job = UploadJob {
            transport: Arc::clone(&self.transport),
            resume: Arc::clone(&self.resume),
            chunk_size: self.chunk_size,
            retry: self.retry.clone(),
            source,
            session: Arc::clone(&session),
            events_tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(job.run());

        UploadHandle::new(events_rx, cancel, session)
    }
}

/// Caller's side of a running upload.
///
/// Dropping the handle cancels the upload.
pub struct UploadHandle {
    events: mpsc::Receiver<UploadEvent>,
    cancel: CancellationToken,
    session: Arc<UploadSession>,
}

impl UploadHandle {
    /// Wraps an event channel. Used by [`Uploader::start`] and by callers
    /// that drive events from elsewhere.
    pub fn new(
        events: mpsc::Receiver<UploadEvent>,
        cancel: CancellationToken,
        session: Arc<UploadSession>,
    ) -> Self {
        Self {
            events,
            cancel,
            session,
        }
    }

    /// Waits for the next event. Returns `None` once the upload has ended
    /// or been aborted.
    pub async fn next_event(&mut self) -> Option<UploadEvent> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            event = self.events.recv() => event,
        }
    }

    /// Returns a buffered event without waiting.
    pub fn try_next_event(&mut self) -> Option<UploadEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        self.events.try_recv().ok()
    }

    /// Stops the upload. No events are delivered afterwards.
    pub fn abort(&mut self) {
        self.cancel.cancel();
        self.events.close();
        while self.events.try_recv().is_ok() {}
        self.session.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn session(&self) -> Arc<UploadSession> {
        Arc::clone(&self.session)
    }
}

impl Drop for UploadHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Where the upload stands between attempts.
#[derive(Default)]
struct UploadState {
    url: Option<String>,
    offset: u64,
    /// Ask the server for its offset before sending more data.
    probe: bool,
}

struct UploadJob {
    transport: Arc<dyn TusTransport>,
    resume: Arc<dyn ResumeStore>,
    chunk_size: usize,
    retry: RetryPolicy,
    source: UploadSource,
    session: Arc<UploadSession>,
    events_tx: mpsc::Sender<UploadEvent>,
    cancel: CancellationToken,
}

impl UploadJob {
    async fn run(self) {
        self.session.start();
        info!(
            "uploading {} ({} bytes) to {}",
            self.source.filename(),
            self.source.size(),
            self.transport.endpoint()
        );

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(TransferError::Cancelled),
            result = self.upload() => result,
        };

        match result {
            Ok(()) => {
                if !self.session.complete() {
                    debug!("upload of {} finished after abort", self.source.filename());
                    return;
                }
                info!("upload of {} complete", self.source.filename());
                self.emit(UploadEvent::Success).await;
            }
            Err(TransferError::Cancelled) => {
                self.session.cancel();
                info!("upload of {} cancelled", self.source.filename());
            }
            Err(e) => {
                let message = e.to_string();
                if !self.session.fail(&message) {
                    return;
                }
                warn!("upload of {} failed: {message}", self.source.filename());
                self.emit(UploadEvent::Failure(message)).await;
            }
        }
    }

    async fn upload(&self) -> Result<(), TransferError> {
        let fingerprint = self.fingerprint().await?;
        let mut state = UploadState::default();
        let mut attempt = 0;

        loop {
            let before = state.offset;
            let Err(e) = self.attempt(&fingerprint, &mut state).await else {
                break;
            };

            if state.offset > before {
                attempt = 0;
            }
            if !e.is_retryable() {
                return Err(e);
            }
            let Some(delay) = self.retry.delay_for_attempt(attempt) else {
                return Err(e);
            };
            attempt += 1;
            warn!(
                "upload of {} interrupted at {}: {e}; retry {attempt} in {delay:?}",
                self.source.filename(),
                state.offset
            );
            tokio::time::sleep(delay).await;
            state.probe = true;
        }

        if let Some(url) = &state.url
            && let Err(e) = self.resume.remove(&fingerprint, url)
        {
            warn!("failed to drop resume record for {url}: {e}");
        }
        Ok(())
    }

    async fn fingerprint(&self) -> Result<String, TransferError> {
        let endpoint = self.transport.endpoint().to_string();
        let source = self.source.clone();
        tokio::task::spawn_blocking(move || fingerprint(&endpoint, &source))
            .await
            .map_err(|e| TransferError::Io(std::io::Error::other(format!("task join error: {e}"))))?
    }

    /// One pass: locate the upload, then send chunks until done or an error.
    async fn attempt(&self, fingerprint: &str, state: &mut UploadState) -> Result<(), TransferError> {
        let url = match state.url.clone() {
            Some(url) => {
                if state.probe {
                    let offset = self.transport.offset(&url).await?;
                    debug!("server holds {offset} bytes of {url}");
                    state.offset = offset;
                    self.session.set_offset(offset, false);
                    state.probe = false;
                }
                url
            }
            None => {
                let (url, offset) = self.resume_or_create(fingerprint).await?;
                self.session.set_upload_url(&url);
                state.url = Some(url.clone());
                state.offset = offset;
                state.probe = false;
                if offset > 0 {
                    self.session.set_offset(offset, false);
                    self.emit_progress(offset).await;
                }
                url
            }
        };

        self.send_chunks(&url, state).await
    }

    /// Continues the oldest matching upload, or creates a new one.
    async fn resume_or_create(&self, fingerprint: &str) -> Result<(String, u64), TransferError> {
        let total = self.source.size();
        let previous = self.resume.find(fingerprint).unwrap_or_else(|e| {
            warn!("failed to read resume records: {e}");
            Vec::new()
        });

        if let Some(prev) = previous.into_iter().next() {
            match self.transport.offset(&prev.upload_url).await {
                Ok(offset) if offset <= total => {
                    info!("resuming {} at {offset}/{total}", prev.upload_url);
                    return Ok((prev.upload_url, offset));
                }
                Ok(offset) => warn!(
                    "server offset {offset} for {} exceeds file size {total}",
                    prev.upload_url
                ),
                // The server may still hold the bytes; let the retry schedule decide.
                Err(e) if e.is_retryable() => return Err(e),
                Err(e) => warn!("previous upload {} is unusable: {e}", prev.upload_url),
            }
            if let Err(e) = self.resume.remove(fingerprint, &prev.upload_url) {
                warn!("failed to drop stale resume record: {e}");
            }
        }

        let metadata = self.source.metadata();
        let url = self.transport.create(total, &metadata).await?;
        let record = PreviousUpload {
            fingerprint: fingerprint.to_string(),
            upload_url: url.clone(),
            size: total,
            filename: self.source.filename().to_string(),
            created_at: Utc::now(),
        };
        if let Err(e) = self.resume.add(record) {
            warn!("failed to remember upload {url}: {e}");
        }
        Ok((url, 0))
    }

    async fn send_chunks(&self, url: &str, state: &mut UploadState) -> Result<(), TransferError> {
        let total = self.source.size();
        while state.offset < total {
            let offset = state.offset;
            let len = (total - offset).min(self.chunk_size as u64) as usize;
            let data = self.read_chunk(offset, len).await?;
            if data.is_empty() {
                return Err(TransferError::Protocol(format!(
                    "{} ended at {offset} of {total} bytes",
                    self.source.filename()
                )));
            }

            let expected = offset + data.len() as u64;
            let acknowledged = self.transport.patch(url, offset, data).await?;
            if acknowledged != expected {
                return Err(TransferError::OffsetMismatch {
                    expected,
                    actual: acknowledged,
                });
            }

            state.offset = acknowledged;
            self.session.set_offset(acknowledged, true);
            self.emit_progress(acknowledged).await;
        }
        Ok(())
    }

    /// Reads `len` bytes at `offset` off the async runtime.
    async fn read_chunk(&self, offset: u64, len: usize) -> Result<Vec<u8>, TransferError> {
        let path = self.source.path().to_path_buf();
        let chunk = tokio::task::spawn_blocking(move || read_chunk_at(&path, offset, len))
            .await
            .map_err(|e| TransferError::Io(std::io::Error::other(format!("task join error: {e}"))))??;
        Ok(chunk.data)
    }

    async fn emit_progress(&self, bytes_sent: u64) {
        self.emit(UploadEvent::Progress {
            bytes_sent,
            bytes_total: self.source.size(),
        })
        .await;
    }

    async fn emit(&self, event: UploadEvent) {
        if self.cancel.is_cancelled() {
            return;
        }
        let _ = self.events_tx.send(event).await;
    }
}
