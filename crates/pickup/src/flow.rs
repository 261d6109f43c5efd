//! State machine behind the "retrieve file" form.
//!
//! The form shows either nothing, an error banner, or the files of a found
//! share, never two at once. A password field appears only after the
//! backend answered that the share is protected.

use serde::Serialize;
use tracing::{info, warn};

use ahavault_api_client::ApiError;
use ahavault_protocol::{LookupRequest, ShareInfo, format_file_size};

use crate::code::{CodeError, PickupCode};
use crate::lookup::ShareLookup;

const PASSWORD_REQUIRED: &str = "Password required";
const LOOKUP_FAILED: &str = "Failed to retrieve file";

/// What the form currently displays.
#[derive(Debug, Clone, PartialEq)]
pub enum PickupView {
    Idle,
    Error(String),
    Found { code: PickupCode, share: ShareInfo },
}

/// One downloadable file of a found share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRow {
    pub file_id: String,
    pub filename: String,
    pub size: u64,
    /// Human-readable size, e.g. `1.5 KB`.
    pub size_label: String,
    pub download_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PickupError {
    #[error(transparent)]
    Invalid(#[from] CodeError),

    /// The share is protected; supply a password and submit again.
    #[error("Password required")]
    PasswordRequired,

    #[error("{message}")]
    Lookup {
        message: String,
        #[source]
        source: ApiError,
    },
}

/// Drives one pickup form.
pub struct PickupFlow<'a> {
    api: &'a dyn ShareLookup,
    input: String,
    password: String,
    requires_password: bool,
    loading: bool,
    view: PickupView,
}

impl<'a> PickupFlow<'a> {
    pub fn new(api: &'a dyn ShareLookup) -> Self {
        Self {
            api,
            input: String::new(),
            password: String::new(),
            requires_password: false,
            loading: false,
            view: PickupView::Idle,
        }
    }

    /// Replaces the code input. Any previous error or result is cleared.
    pub fn set_code(&mut self, input: &str) {
        self.input = PickupCode::normalize_input(input);
        self.view = PickupView::Idle;
    }

    pub fn set_password(&mut self, password: &str) {
        self.password = password.to_string();
    }

    pub fn code(&self) -> &str {
        &self.input
    }

    /// Whether the password field is shown.
    pub fn requires_password(&self) -> bool {
        self.requires_password
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Submit is disabled while a lookup is in flight.
    pub fn can_submit(&self) -> bool {
        !self.loading
    }

    pub fn view(&self) -> &PickupView {
        &self.view
    }

    pub fn error(&self) -> Option<&str> {
        match &self.view {
            PickupView::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn share(&self) -> Option<&ShareInfo> {
        match &self.view {
            PickupView::Found { share, .. } => Some(share),
            _ => None,
        }
    }

    /// Validates the code and looks the share up.
    ///
    /// The password is sent only once the backend has asked for one.
    pub async fn submit(&mut self) -> Result<(), PickupError> {
        let code = match PickupCode::parse(&self.input) {
            Ok(code) => code,
            Err(e) => {
                self.view = PickupView::Error(e.to_string());
                return Err(e.into());
            }
        };

        let req = LookupRequest {
            password: (self.requires_password && !self.password.is_empty())
                .then(|| self.password.clone()),
            captcha_token: None,
        };

        self.loading = true;
        self.view = PickupView::Idle;
        let result = self.api.lookup(&code, req).await;
        self.loading = false;

        match result {
            Ok(share) => {
                info!(
                    "share {} found via {code}: {} file(s)",
                    share.share_id,
                    share.files.len()
                );
                self.requires_password = false;
                self.view = PickupView::Found { code, share };
                Ok(())
            }
            Err(e) if e.is_password_required() => {
                info!("share {code} is password protected");
                self.requires_password = true;
                self.view = PickupView::Error(PASSWORD_REQUIRED.to_string());
                Err(PickupError::PasswordRequired)
            }
            Err(e) => {
                warn!("lookup of {code} failed: {e}");
                let message = e.user_message(LOOKUP_FAILED);
                self.view = PickupView::Error(message.clone());
                Err(PickupError::Lookup { message, source: e })
            }
        }
    }

    /// Rows for the found share, empty otherwise.
    pub fn rows(&self) -> Vec<FileRow> {
        let PickupView::Found { code, share } = &self.view else {
            return Vec::new();
        };
        share
            .files
            .iter()
            .map(|file| FileRow {
                file_id: file.file_id.clone(),
                filename: file.filename.clone(),
                size: file.size,
                size_label: format_file_size(file.size),
                download_url: self.api.download_url(code, &file.file_id),
            })
            .collect()
    }

    /// "Pick up another": clears code, password and result.
    pub fn reset(&mut self) {
        self.input.clear();
        self.password.clear();
        self.requires_password = false;
        self.loading = false;
        self.view = PickupView::Idle;
    }
}
