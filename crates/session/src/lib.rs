//! Auth session for AhaVault clients.
//!
//! [`SessionStore`] owns the current login and persists it through a
//! [`SessionStorage`] port; [`AuthFlow`] implements the login, register
//! and logout screens on top of it.

pub mod auth;
pub mod store;

pub use auth::{AuthApi, AuthError, AuthFlow};
pub use store::{
    AuthSession, FileStorage, MemoryStorage, SessionError, SessionStorage, SessionStore,
    config_dir, default_session_path,
};
