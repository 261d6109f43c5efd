//! Auth session persistence.
//!
//! The current session lives in a [`SessionStore`], which writes through to
//! an injected [`SessionStorage`] so a login survives restarts.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ahavault_protocol::User;

/// Errors from session persistence.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A logged-in user and the bearer token issued for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Storage port for the session.
pub trait SessionStorage: Send + Sync {
    /// Returns the stored session, if any.
    fn load(&self) -> Result<Option<AuthSession>, SessionError>;

    fn save(&self, session: &AuthSession) -> Result<(), SessionError>;

    /// Removes the stored session. Clearing an empty storage is not an error.
    fn clear(&self) -> Result<(), SessionError>;
}

/// Session persisted as a JSON file.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<AuthSession>, SessionError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&self.path)?;
        let session: AuthSession = serde_json::from_str(&data)?;
        debug!(path = ?self.path, user_id = %session.user.user_id, "loaded session");
        Ok(Some(session))
    }

    fn save(&self, session: &AuthSession) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(session)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        debug!(path = ?self.path, "persisted session");
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage, for tests and ephemeral use.
#[derive(Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<AuthSession>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage already holding `session`.
    pub fn with_session(session: AuthSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<AuthSession>, SessionError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    fn save(&self, session: &AuthSession) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// Holds the current auth session.
pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    current: Option<AuthSession>,
}

impl SessionStore {
    /// Opens the store, rehydrating from `storage`.
    ///
    /// An unreadable stored session is logged and treated as logged out.
    pub fn open(storage: Box<dyn SessionStorage>) -> Self {
        let current = match storage.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "discarding unreadable session");
                None
            }
        };
        Self { storage, current }
    }

    /// Opens a store backed by a JSON file at `path`.
    pub fn open_file(path: PathBuf) -> Self {
        Self::open(Box::new(FileStorage::new(path)))
    }

    /// Records a new session and persists it.
    ///
    /// The in-memory session is updated even when persisting fails.
    pub fn set_auth(&mut self, user: User, token: String) -> Result<(), SessionError> {
        let session = AuthSession { user, token };
        let result = self.storage.save(&session);
        self.current = Some(session);
        result
    }

    /// Drops the session from memory and storage.
    pub fn clear_auth(&mut self) -> Result<(), SessionError> {
        self.current = None;
        self.storage.clear()
    }

    pub fn current(&self) -> Option<&AuthSession> {
        self.current.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|s| &s.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }
}

/// Returns the default session file path.
pub fn default_session_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("ahavault").join("session.json"))
}

/// Returns the platform-specific config directory.
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(".config"))
    }
}
