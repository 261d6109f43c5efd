//! Two-step "create share" dialog: options form, then the pickup code.

use tracing::{info, warn};

use ahavault_protocol::constants::{SHARE_EXPIRY_PRESETS, SHARE_MAX_DOWNLOAD_PRESETS};
use ahavault_protocol::{CreateShareRequest, CreatedShare};

use crate::api::VaultApi;
use crate::error::CabinetError;
use crate::toast::ToastQueue;

const DEFAULT_EXPIRY_SECS: i64 = 24 * 3600;
const DEFAULT_MAX_DOWNLOADS: i32 = 10;
const CREATE_FAILED: &str = "Failed to create share";

#[derive(Debug, Clone, PartialEq)]
pub enum ShareStep {
    Form,
    Result(CreatedShare),
}

/// Options for sharing a set of files.
#[derive(Debug, Clone)]
pub struct ShareDialog {
    file_ids: Vec<String>,
    expires_in: i64,
    max_downloads: i32,
    password: String,
    loading: bool,
    step: ShareStep,
}

impl ShareDialog {
    /// Opens the form with 24 h expiry and 10 downloads.
    pub fn new(file_ids: Vec<String>) -> Self {
        Self {
            file_ids,
            expires_in: DEFAULT_EXPIRY_SECS,
            max_downloads: DEFAULT_MAX_DOWNLOADS,
            password: String::new(),
            loading: false,
            step: ShareStep::Form,
        }
    }

    /// Expiry choices in seconds: 1 h, 24 h, 7 d.
    pub fn expiry_presets() -> &'static [i64] {
        &SHARE_EXPIRY_PRESETS
    }

    pub fn max_download_presets() -> &'static [i32] {
        &SHARE_MAX_DOWNLOAD_PRESETS
    }

    pub fn set_expires_in(&mut self, secs: i64) -> Result<(), CabinetError> {
        if secs <= 0 {
            return Err(CabinetError::Validation("Expiry must be positive"));
        }
        self.expires_in = secs;
        Ok(())
    }

    /// 0 means unlimited.
    pub fn set_max_downloads(&mut self, max: i32) -> Result<(), CabinetError> {
        if max < 0 {
            return Err(CabinetError::Validation("Max downloads cannot be negative"));
        }
        self.max_downloads = max;
        Ok(())
    }

    pub fn set_password(&mut self, password: &str) {
        self.password = password.to_string();
    }

    pub fn file_count(&self) -> usize {
        self.file_ids.len()
    }

    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }

    pub fn max_downloads(&self) -> i32 {
        self.max_downloads
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn step(&self) -> &ShareStep {
        &self.step
    }

    /// Pickup code once the share exists.
    pub fn pickup_code(&self) -> Option<&str> {
        match &self.step {
            ShareStep::Result(share) => Some(&share.pickup_code),
            ShareStep::Form => None,
        }
    }

    /// Request body for the current options; an empty password is omitted.
    pub fn request(&self) -> CreateShareRequest {
        CreateShareRequest {
            file_ids: self.file_ids.clone(),
            expires_in: self.expires_in,
            max_downloads: self.max_downloads,
            password: Some(self.password.clone()).filter(|p| !p.is_empty()),
        }
    }

    /// Creates the share and moves to the result step.
    ///
    /// Failures push an error notification and keep the form open.
    pub async fn submit(
        &mut self,
        api: &dyn VaultApi,
        toasts: &mut ToastQueue,
    ) -> Result<CreatedShare, CabinetError> {
        if self.file_ids.is_empty() {
            return Err(CabinetError::Validation("Select at least one file to share"));
        }

        self.loading = true;
        let result = api.create_share(self.request()).await;
        self.loading = false;

        match result {
            Ok(share) => {
                info!(
                    share_id = %share.share_id,
                    files = self.file_ids.len(),
                    "share ready for pickup"
                );
                self.step = ShareStep::Result(share.clone());
                Ok(share)
            }
            Err(e) => {
                warn!("{CREATE_FAILED}: {e}");
                toasts.error(CREATE_FAILED);
                Err(CabinetError::api(e, CREATE_FAILED))
            }
        }
    }
}
