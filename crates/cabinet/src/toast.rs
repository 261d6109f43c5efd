//! Non-blocking notifications raised by the cabinet flows.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    /// Errors stay up for 6 s, everything else for 4 s.
    pub fn lifetime(self) -> Duration {
        match self {
            ToastKind::Error => Duration::from_secs(6),
            _ => Duration::from_secs(4),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: String,
    pub message: Option<String>,
    pub shown_at: Instant,
}

impl Toast {
    pub fn text(&self) -> String {
        match &self.message {
            Some(message) => format!("{}: {message}", self.title),
            None => self.title.clone(),
        }
    }

    pub fn expires_at(&self) -> Instant {
        self.shown_at + self.kind.lifetime()
    }
}

/// Pending notifications, oldest first. The owner decides when to render
/// and when to call [`ToastQueue::expire`].
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    toasts: VecDeque<Toast>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&mut self, kind: ToastKind, title: impl Into<String>, message: Option<String>) {
        self.toasts.push_back(Toast {
            kind,
            title: title.into(),
            message,
            shown_at: Instant::now(),
        });
    }

    pub fn success(&mut self, title: impl Into<String>) {
        self.notify(ToastKind::Success, title, None);
    }

    pub fn error(&mut self, title: impl Into<String>) {
        self.notify(ToastKind::Error, title, None);
    }

    /// Error with a detail line, e.g. the reason an upload failed.
    pub fn error_with(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.notify(ToastKind::Error, title, Some(message.into()));
    }

    /// Drops every toast whose lifetime has run out at `now` and returns
    /// how many were dropped.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.expires_at() > now);
        before - self.toasts.len()
    }

    pub fn drain(&mut self) -> Vec<Toast> {
        self.toasts.drain(..).collect()
    }

    pub fn last(&self) -> Option<&Toast> {
        self.toasts.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}
