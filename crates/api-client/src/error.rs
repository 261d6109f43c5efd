//! Normalized API errors.

use ahavault_protocol::Envelope;
use ahavault_protocol::constants::CODE_PASSWORD_REQUIRED;

/// Errors from the AhaVault REST client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status or a non-zero envelope code.
    #[error("{message}")]
    Server {
        status: u16,
        code: i32,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("response carried no data")]
    EmptyPayload,

    #[error("invalid bearer token")]
    InvalidToken,
}

impl ApiError {
    /// Builds a server error from a status and the raw response body.
    ///
    /// The envelope code wins when present and non-zero; otherwise the HTTP
    /// status doubles as the code.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let envelope = serde_json::from_str::<Envelope>(body).ok();
        let code = envelope
            .as_ref()
            .map(|e| e.code)
            .filter(|c| *c != 0)
            .unwrap_or(i32::from(status));
        let message = envelope
            .as_ref()
            .map(|e| e.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Request failed with status {status}"));
        let data = envelope.as_ref().and_then(Envelope::data_value);
        Self::Server {
            status,
            code,
            message,
            data,
        }
    }

    /// Application code of a server error.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Server { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// HTTP status of a server error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the backend asked for a share password.
    pub fn is_password_required(&self) -> bool {
        self.code() == Some(CODE_PASSWORD_REQUIRED)
    }

    /// Message suitable for display: the server's own message when it sent
    /// one, `fallback` for transport and decoding failures.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Server { message, .. } if !message.is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}
