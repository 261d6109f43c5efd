//! Wire types shared by every AhaVault client crate.
//!
//! Mirrors the JSON shapes served by the AhaVault backend under `/api`.

pub mod constants;
pub mod envelope;
pub mod format;
pub mod types;

// Re-export primary types for convenience.
pub use envelope::Envelope;
pub use format::{format_file_size, format_number, format_percent, percent};
pub use types::{
    AuthPayload, CreateShareRequest, CreatedShare, FileInfo, FileItem, FileListPage, HealthStatus,
    LoginRequest, LookupRequest, RegisterRequest, SaveToVaultRequest, SavedToVault, ShareInfo,
    ShareStatus, ShareSummary, SharesPage, User,
};
