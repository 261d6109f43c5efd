//! Login, registration and logout flows.
//!
//! Flows validate input locally, call the backend through [`AuthApi`] and
//! record the outcome in a [`SessionStore`].

use std::future::Future;
use std::pin::Pin;

use tracing::{info, warn};

use ahavault_api_client::{ApiError, Client};
use ahavault_protocol::constants::MIN_PASSWORD_LEN;
use ahavault_protocol::{AuthPayload, LoginRequest, RegisterRequest, User};

use crate::store::{SessionError, SessionStore};

type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Backend operations the auth flows depend on.
///
/// Implemented for [`Client`]; tests substitute a mock.
pub trait AuthApi: Send + Sync {
    fn login(&self, req: LoginRequest) -> ApiFuture<'_, AuthPayload>;

    fn register(&self, req: RegisterRequest) -> ApiFuture<'_, AuthPayload>;

    fn logout(&self) -> ApiFuture<'_, ()>;

    fn current_user(&self) -> ApiFuture<'_, User>;
}

impl AuthApi for Client {
    fn login(&self, req: LoginRequest) -> ApiFuture<'_, AuthPayload> {
        Box::pin(async move { Client::login(self, &req).await })
    }

    fn register(&self, req: RegisterRequest) -> ApiFuture<'_, AuthPayload> {
        Box::pin(async move { Client::register(self, &req).await })
    }

    fn logout(&self) -> ApiFuture<'_, ()> {
        Box::pin(Client::logout(self))
    }

    fn current_user(&self) -> ApiFuture<'_, User> {
        Box::pin(Client::current_user(self))
    }
}

/// Errors surfaced by the auth flows.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Input rejected before any network call.
    #[error("{0}")]
    Validation(&'static str),

    /// The backend (or the network) refused the request.
    #[error("{message}")]
    Rejected {
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("not logged in")]
    NotAuthenticated,

    #[error("session storage error: {0}")]
    Session(#[from] SessionError),
}

/// Drives the auth screens against a session store.
pub struct AuthFlow<'a> {
    api: &'a dyn AuthApi,
    session: &'a mut SessionStore,
}

impl<'a> AuthFlow<'a> {
    pub fn new(api: &'a dyn AuthApi, session: &'a mut SessionStore) -> Self {
        Self { api, session }
    }

    /// Logs in and stores the resulting session.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation("Please enter both email and password"));
        }

        let req = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            captcha_token: None,
        };
        let payload = self
            .api
            .login(req)
            .await
            .map_err(|e| rejected(e, "Login failed"))?;
        self.establish(payload)
    }

    /// Registers an account and stores the resulting session.
    ///
    /// A blank invite code is not sent.
    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        invite_code: Option<&str>,
    ) -> Result<User, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Validation("Please fill in required fields"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters",
            ));
        }

        let req = RegisterRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            invite_code: invite_code
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        };
        let payload = self
            .api
            .register(req)
            .await
            .map_err(|e| rejected(e, "Registration failed"))?;
        self.establish(payload)
    }

    /// Ends the session. The local session is cleared even when the server
    /// call fails.
    pub async fn logout(&mut self) -> Result<(), AuthError> {
        if self.session.is_authenticated()
            && let Err(e) = self.api.logout().await
        {
            warn!(error = %e, "server logout failed, clearing local session anyway");
        }
        self.session.clear_auth()?;
        info!("logged out");
        Ok(())
    }

    /// Fetches the current user from the backend.
    pub async fn whoami(&self) -> Result<User, AuthError> {
        if !self.session.is_authenticated() {
            return Err(AuthError::NotAuthenticated);
        }
        self.api
            .current_user()
            .await
            .map_err(|e| rejected(e, "Failed to load profile"))
    }

    fn establish(&mut self, payload: AuthPayload) -> Result<User, AuthError> {
        let (user, token) = payload.into_parts();
        self.session.set_auth(user.clone(), token)?;
        info!(user_id = %user.user_id, role = %user.role, "session established");
        Ok(user)
    }
}

fn rejected(source: ApiError, fallback: &str) -> AuthError {
    AuthError::Rejected {
        message: source.user_message(fallback),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockApi {
        login_result: Mutex<Option<Result<AuthPayload, ApiError>>>,
        register_result: Mutex<Option<Result<AuthPayload, ApiError>>>,
        logout_fails: bool,
        calls: Mutex<Vec<String>>,
        last_register: Mutex<Option<RegisterRequest>>,
    }

    impl MockApi {
        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AuthApi for MockApi {
        fn login(&self, _req: LoginRequest) -> ApiFuture<'_, AuthPayload> {
            self.record("login");
            let result = self
                .login_result
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(ApiError::EmptyPayload));
            Box::pin(async move { result })
        }

        fn register(&self, req: RegisterRequest) -> ApiFuture<'_, AuthPayload> {
            self.record("register");
            *self.last_register.lock().unwrap() = Some(req);
            let result = self
                .register_result
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(ApiError::EmptyPayload));
            Box::pin(async move { result })
        }

        fn logout(&self) -> ApiFuture<'_, ()> {
            self.record("logout");
            let fails = self.logout_fails;
            Box::pin(async move {
                if fails {
                    Err(ApiError::EmptyPayload)
                } else {
                    Ok(())
                }
            })
        }

        fn current_user(&self) -> ApiFuture<'_, User> {
            self.record("current_user");
            Box::pin(async move {
                Ok(User {
                    user_id: "u1".into(),
                    email: "a@b.c".into(),
                    role: "user".into(),
                })
            })
        }
    }

    fn payload(role: Option<&str>) -> AuthPayload {
        AuthPayload {
            user_id: "u1".into(),
            email: "a@b.c".into(),
            role: role.map(str::to_string),
            token: "jwt".into(),
            expires_in: 3600,
        }
    }

    fn server_error(message: &str) -> ApiError {
        ApiError::Server {
            status: 401,
            code: 401,
            message: message.into(),
            data: None,
        }
    }

    fn store() -> SessionStore {
        SessionStore::open(Box::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn login_requires_both_fields() {
        let api = MockApi::default();
        let mut session = store();
        let mut flow = AuthFlow::new(&api, &mut session);

        let err = flow.login("", "secret").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter both email and password");
        let err = flow.login("a@b.c", "").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter both email and password");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn login_success_stores_session_with_default_role() {
        let api = MockApi::default();
        *api.login_result.lock().unwrap() = Some(Ok(payload(None)));
        let mut session = store();

        let user = AuthFlow::new(&api, &mut session)
            .login("a@b.c", "secret")
            .await
            .unwrap();
        assert_eq!(user.role, "user");
        assert_eq!(session.token(), Some("jwt"));
    }

    #[tokio::test]
    async fn login_failure_uses_server_message() {
        let api = MockApi::default();
        *api.login_result.lock().unwrap() = Some(Err(server_error("Invalid email or password")));
        let mut session = store();

        let err = AuthFlow::new(&api, &mut session)
            .login("a@b.c", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn login_failure_fallback_message() {
        let api = MockApi::default();
        let mut session = store();

        let err = AuthFlow::new(&api, &mut session)
            .login("a@b.c", "pw")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Login failed");
    }

    #[tokio::test]
    async fn register_validation_order() {
        let api = MockApi::default();
        let mut session = store();
        let mut flow = AuthFlow::new(&api, &mut session);

        let err = flow.register("", "", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Please fill in required fields");
        let err = flow.register("a@b.c", "short", None).await.unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 8 characters");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn register_drops_blank_invite_code() {
        let api = MockApi::default();
        *api.register_result.lock().unwrap() = Some(Ok(payload(Some("admin"))));
        let mut session = store();

        let user = AuthFlow::new(&api, &mut session)
            .register("a@b.c", "longenough", Some("  "))
            .await
            .unwrap();
        assert_eq!(user.role, "admin");
        let sent = api.last_register.lock().unwrap().clone().unwrap();
        assert!(sent.invite_code.is_none());
    }

    #[tokio::test]
    async fn register_failure_fallback_message() {
        let api = MockApi::default();
        let mut session = store();

        let err = AuthFlow::new(&api, &mut session)
            .register("a@b.c", "longenough", Some("INV-1"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Registration failed");
        let sent = api.last_register.lock().unwrap().clone().unwrap();
        assert_eq!(sent.invite_code.as_deref(), Some("INV-1"));
    }

    #[tokio::test]
    async fn logout_clears_even_when_server_fails() {
        let api = MockApi {
            logout_fails: true,
            ..Default::default()
        };
        let mut session = store();
        session.set_auth(payload(None).into_parts().0, "jwt".into()).unwrap();

        AuthFlow::new(&api, &mut session).logout().await.unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(api.calls(), vec!["logout"]);
    }

    #[tokio::test]
    async fn logout_when_logged_out_skips_server() {
        let api = MockApi::default();
        let mut session = store();

        AuthFlow::new(&api, &mut session).logout().await.unwrap();
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn whoami_requires_session() {
        let api = MockApi::default();
        let mut session = store();

        let err = AuthFlow::new(&api, &mut session).whoami().await.unwrap_err();
        assert!(matches!(err, AuthError::NotAuthenticated));

        session.set_auth(payload(None).into_parts().0, "jwt".into()).unwrap();
        let user = AuthFlow::new(&api, &mut session).whoami().await.unwrap();
        assert_eq!(user.user_id, "u1");
    }
}
