//! Authenticated cabinet: browsing and deleting files, uploading, creating
//! and managing shares, and the notification queue those flows report to.

pub mod api;
pub mod error;
pub mod files;
pub mod share;
pub mod shares;
pub mod toast;
pub mod upload;

pub use api::{VaultApi, VaultFuture};
pub use error::CabinetError;
pub use files::{FileBrowser, FilesView};
pub use share::{ShareDialog, ShareStep};
pub use shares::{SharesBrowser, save_shared_files};
pub use toast::{Toast, ToastKind, ToastQueue};
pub use upload::{UploadControl, UploadStarter, UploadState};

#[cfg(test)]
mod test_support;
