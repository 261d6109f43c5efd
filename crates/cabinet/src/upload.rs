//! Upload button state: idle, or uploading with a percentage.

use std::sync::Arc;

use tracing::{debug, info, warn};

use ahavault_protocol::percent;
use ahavault_transfer::{UploadEvent, UploadHandle, UploadSource, Uploader};

use crate::error::CabinetError;
use crate::toast::ToastQueue;

/// Starts an upload for a selected file.
pub trait UploadStarter: Send + Sync {
    fn start(&self, source: UploadSource) -> UploadHandle;
}

impl UploadStarter for Uploader {
    fn start(&self, source: UploadSource) -> UploadHandle {
        Uploader::start(self, source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Uploading { percent: u8 },
}

/// One upload control. At most one upload runs through it at a time.
pub struct UploadControl {
    starter: Arc<dyn UploadStarter>,
    on_complete: Box<dyn FnMut() + Send>,
    handle: Option<UploadHandle>,
    filename: Option<String>,
    percent: u8,
    bytes_sent: u64,
}

impl UploadControl {
    /// `on_complete` runs once per successful upload, typically to refresh
    /// the file list.
    pub fn new(starter: Arc<dyn UploadStarter>, on_complete: impl FnMut() + Send + 'static) -> Self {
        Self {
            starter,
            on_complete: Box::new(on_complete),
            handle: None,
            filename: None,
            percent: 0,
            bytes_sent: 0,
        }
    }

    pub fn state(&self) -> UploadState {
        if self.handle.is_some() {
            UploadState::Uploading {
                percent: self.percent,
            }
        } else {
            UploadState::Idle
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.handle.is_some()
    }

    /// Last reported completion, `0..=100`.
    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Bytes acknowledged by the server for the current upload.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Progress label such as `50%`, shown while uploading.
    pub fn label(&self) -> Option<String> {
        self.is_uploading().then(|| format!("{}%", self.percent))
    }

    /// Starts uploading the selected file.
    pub fn select(&mut self, source: UploadSource) -> Result<(), CabinetError> {
        if self.is_uploading() {
            return Err(CabinetError::Busy);
        }
        debug!(filename = source.filename(), size = source.size(), "file selected");
        self.filename = Some(source.filename().to_string());
        self.percent = 0;
        self.bytes_sent = 0;
        self.handle = Some(self.starter.start(source));
        Ok(())
    }

    /// Applies one event from the running upload. Events arriving while
    /// idle are ignored.
    pub fn apply(&mut self, event: UploadEvent, toasts: &mut ToastQueue) {
        if self.handle.is_none() {
            return;
        }
        match event {
            UploadEvent::Progress {
                bytes_sent,
                bytes_total,
            } => {
                self.bytes_sent = bytes_sent;
                self.percent = percent(bytes_sent, bytes_total);
            }
            UploadEvent::Success => {
                self.handle = None;
                self.percent = 100;
                info!(filename = self.filename.as_deref(), "upload finished");
                (self.on_complete)();
            }
            UploadEvent::Failure(message) => {
                self.handle = None;
                warn!(filename = self.filename.as_deref(), "upload failed: {message}");
                toasts.error_with("Upload failed", message);
            }
        }
    }

    /// Waits for one event of the running upload and applies it.
    ///
    /// Returns `false` once the control is idle again.
    pub async fn step(&mut self, toasts: &mut ToastQueue) -> bool {
        let Some(handle) = self.handle.as_mut() else {
            return false;
        };
        match handle.next_event().await {
            Some(event) => self.apply(event, toasts),
            None => {
                // Channel closed without a terminal event.
                self.handle = None;
            }
        }
        self.handle.is_some()
    }

    /// Feeds events from the running upload until it ends.
    pub async fn run(&mut self, toasts: &mut ToastQueue) {
        while self.step(toasts).await {}
    }

    /// Aborts the running upload and returns to idle.
    pub fn cancel(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.abort();
            info!(filename = self.filename.as_deref(), "upload cancelled");
        }
    }
}
