use ahavault_api_client::ApiError;

/// Errors surfaced by the cabinet flows.
#[derive(Debug, thiserror::Error)]
pub enum CabinetError {
    /// Input rejected before any network call.
    #[error("{0}")]
    Validation(&'static str),

    /// An upload is already running on this control.
    #[error("an upload is already in progress")]
    Busy,

    #[error("{message}")]
    Api {
        message: String,
        #[source]
        source: ApiError,
    },
}

impl CabinetError {
    /// Wraps `source`, preferring the server's message over `fallback`.
    pub(crate) fn api(source: ApiError, fallback: &str) -> Self {
        Self::Api {
            message: source.user_message(fallback),
            source,
        }
    }

    /// `true` when the server refused because the share needs a password.
    pub fn is_password_required(&self) -> bool {
        matches!(self, Self::Api { source, .. } if source.is_password_required())
    }
}
