use std::time::Duration;

/// Default API base URL (the backend mounts every JSON route under `/api`).
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Timeout for JSON request/response calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Envelope `code` for a successful call.
pub const CODE_OK: i32 = 0;

/// Envelope `code` returned by the public lookup when the share is
/// password-protected and no (or no valid) password was supplied.
pub const CODE_PASSWORD_REQUIRED: i32 = 4040;

/// Number of significant characters in a pickup code.
pub const PICKUP_CODE_LEN: usize = 8;

/// Maximum accepted length of pickup input, separators included
/// (display form `AHA-XXXX-XXXX`).
pub const PICKUP_INPUT_MAX_LEN: usize = 13;

/// Alphabet the backend draws pickup codes from (no 0/O/1/I).
pub const PICKUP_CODE_CHARSET: &str = "23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Role assigned when the backend omits one.
pub const DEFAULT_ROLE: &str = "user";

/// Path of the tus upload endpoint, relative to the API base.
pub const TUS_UPLOAD_PATH: &str = "/tus/upload";

/// tus protocol version spoken by the client.
pub const TUS_RESUMABLE: &str = "1.0.0";

/// Page size the cabinet requests when listing files.
pub const CABINET_PAGE_SIZE: u32 = 100;

/// Share expiry presets offered when creating a share, in seconds.
pub const SHARE_EXPIRY_PRESETS: [i64; 3] = [3600, 86_400, 604_800];

/// Max-download presets offered when creating a share.
pub const SHARE_MAX_DOWNLOAD_PRESETS: [i32; 4] = [1, 5, 10, 100];
