use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ROLE;

/// An authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

/// Payload of a successful `POST /auth/login` or `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user_id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub token: String,
    /// Token lifetime in seconds, as issued by the backend.
    #[serde(default)]
    pub expires_in: i64,
}

impl AuthPayload {
    /// Splits the payload into the user it describes and its bearer token.
    ///
    /// A missing or empty role falls back to [`DEFAULT_ROLE`].
    pub fn into_parts(self) -> (User, String) {
        let role = self
            .role
            .filter(|r| !r.is_empty())
            .unwrap_or_else(default_role);
        (
            User {
                user_id: self.user_id,
                email: self.email,
                role,
            },
            self.token,
        )
    }
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captcha_token: Option<String>,
}

/// A file in the authenticated user's cabinet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileItem {
    pub id: String,
    pub filename: String,
    pub size: u64,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub hash: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub share_count: u32,
}

/// Page returned by `GET /files`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileListPage {
    #[serde(default)]
    pub items: Vec<FileItem>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

/// One file inside a share, as returned by the public lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_id: String,
    pub filename: String,
    pub size: u64,
    #[serde(default)]
    pub mime_type: String,
}

/// Result of a successful pickup-code lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareInfo {
    pub share_id: String,
    #[serde(default)]
    pub files: Vec<FileInfo>,
    pub expires_at: DateTime<Utc>,
    /// Downloads left; negative means unlimited.
    pub remaining_downloads: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_password: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_captcha: Option<bool>,
}

impl ShareInfo {
    /// Returns `true` if the share has no download limit.
    pub fn is_unlimited(&self) -> bool {
        self.remaining_downloads < 0
    }

    /// Total size of all files in the share.
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Body of `POST /public/shares/:code`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captcha_token: Option<String>,
}

/// Body of `POST /shares`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateShareRequest {
    pub file_ids: Vec<String>,
    /// Lifetime of the share in seconds.
    pub expires_in: i64,
    /// Download limit; 0 means unlimited.
    pub max_downloads: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Payload of a successful `POST /shares`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedShare {
    pub share_id: String,
    pub pickup_code: String,
    pub expires_at: DateTime<Utc>,
}

/// Lifecycle state of a share, derived from its counters and timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareStatus {
    Active,
    Expired,
    Exhausted,
    Stopped,
}

/// One entry of `GET /shares`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareSummary {
    pub id: String,
    pub pickup_code: String,
    #[serde(default)]
    pub max_downloads: i32,
    #[serde(default)]
    pub current_downloads: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
}

impl ShareSummary {
    /// Derives the share status at `now`.
    ///
    /// Precedence: stopped, then expired, then exhausted.
    pub fn status_at(&self, now: DateTime<Utc>) -> ShareStatus {
        if self.stopped_at.is_some() {
            return ShareStatus::Stopped;
        }
        if self.expires_at < now {
            return ShareStatus::Expired;
        }
        if self.max_downloads > 0 && self.current_downloads >= self.max_downloads {
            return ShareStatus::Exhausted;
        }
        ShareStatus::Active
    }

    /// Downloads left, or `None` when unlimited.
    pub fn remaining_downloads(&self) -> Option<i32> {
        if self.max_downloads == 0 {
            None
        } else {
            Some((self.max_downloads - self.current_downloads).max(0))
        }
    }
}

/// Page returned by `GET /shares`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharesPage {
    #[serde(default)]
    pub shares: Vec<ShareSummary>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

/// Body of `POST /shares/:code/save`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveToVaultRequest {
    pub file_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Payload of a successful `POST /shares/:code/save`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedToVault {
    #[serde(default)]
    pub saved_ids: Vec<String>,
}

/// Body of `GET /health`, served outside the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
