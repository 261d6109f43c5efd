//! AhaVault REST client.
//!
//! Async HTTP client using `reqwest`. Every JSON route answers with the
//! `{code, message, data}` envelope; failures are normalized into
//! [`ApiError::Server`] in one place.

use std::path::Path;
use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use ahavault_protocol::constants::{DEFAULT_API_URL, REQUEST_TIMEOUT, TUS_UPLOAD_PATH};
use ahavault_protocol::{
    AuthPayload, CreateShareRequest, CreatedShare, Envelope, FileListPage, HealthStatus,
    LoginRequest, LookupRequest, RegisterRequest, SaveToVaultRequest, SavedToVault, ShareInfo,
    SharesPage, User,
};

use crate::error::ApiError;

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// AhaVault API client.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl Client {
    /// Creates a client for the API mounted at `base_url`
    /// (e.g. `http://localhost:8080/api`).
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            timeout: REQUEST_TIMEOUT,
        })
    }

    /// Creates a client for [`DEFAULT_API_URL`].
    pub fn local() -> Result<Self, ApiError> {
        Self::new(DEFAULT_API_URL)
    }

    /// Attaches a bearer token to every subsequent request.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Overrides the per-request timeout of JSON calls (default 10 s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces (or clears) the bearer token.
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// `POST /auth/register`
    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthPayload, ApiError> {
        let payload: AuthPayload = self
            .call(self.request(Method::POST, "/auth/register")?.json(req))
            .await?;
        info!(user_id = %payload.user_id, "registered");
        Ok(payload)
    }

    /// `POST /auth/login`
    pub async fn login(&self, req: &LoginRequest) -> Result<AuthPayload, ApiError> {
        let payload: AuthPayload = self
            .call(self.request(Method::POST, "/auth/login")?.json(req))
            .await?;
        info!(user_id = %payload.user_id, "logged in");
        Ok(payload)
    }

    /// `POST /auth/logout`
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.send(self.request(Method::POST, "/auth/logout")?)
            .await
            .map(drop)
    }

    /// `GET /user/me`
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.call(self.request(Method::GET, "/user/me")?).await
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    /// `GET /files`. An empty `search` is not sent.
    pub async fn list_files(
        &self,
        page: u32,
        page_size: u32,
        search: Option<&str>,
    ) -> Result<FileListPage, ApiError> {
        let mut params = vec![
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
        ];
        if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("search", term.to_string()));
        }
        let page: FileListPage = self
            .call(self.request(Method::GET, "/files")?.query(&params))
            .await?;
        debug!(items = page.items.len(), total = page.total, "listed files");
        Ok(page)
    }

    /// `DELETE /files/:id`
    pub async fn delete_file(&self, file_id: &str) -> Result<(), ApiError> {
        let path = format!("/files/{}", segment(file_id));
        self.send(self.request(Method::DELETE, &path)?).await?;
        info!(file_id, "deleted file");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Shares
    // -----------------------------------------------------------------------

    /// `POST /shares`
    pub async fn create_share(&self, req: &CreateShareRequest) -> Result<CreatedShare, ApiError> {
        let share: CreatedShare = self
            .call(self.request(Method::POST, "/shares")?.json(req))
            .await?;
        info!(share_id = %share.share_id, files = req.file_ids.len(), "created share");
        Ok(share)
    }

    /// `GET /shares`
    pub async fn list_shares(&self, page: u32, page_size: u32) -> Result<SharesPage, ApiError> {
        let params = [
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
        ];
        self.call(self.request(Method::GET, "/shares")?.query(&params))
            .await
    }

    /// `DELETE /shares/:id`
    pub async fn stop_share(&self, share_id: &str) -> Result<(), ApiError> {
        let path = format!("/shares/{}", segment(share_id));
        self.send(self.request(Method::DELETE, &path)?).await?;
        info!(share_id, "stopped share");
        Ok(())
    }

    /// `POST /shares/:code/save`
    pub async fn save_to_vault(
        &self,
        code: &str,
        req: &SaveToVaultRequest,
    ) -> Result<SavedToVault, ApiError> {
        let path = format!("/shares/{}/save", segment(code));
        self.call(self.request(Method::POST, &path)?.json(req)).await
    }

    /// `POST /public/shares/:code`
    pub async fn lookup_share(&self, code: &str, req: &LookupRequest) -> Result<ShareInfo, ApiError> {
        let path = format!("/public/shares/{}", segment(code));
        debug!(code, with_password = req.password.is_some(), "looking up share");
        self.call(self.request(Method::POST, &path)?.json(req)).await
    }

    // -----------------------------------------------------------------------
    // Misc
    // -----------------------------------------------------------------------

    /// `GET /health` on the server root (outside the API prefix).
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = format!("{}/health", self.root_url());
        let resp = self.http.get(&url).timeout(self.timeout).send().await?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Download URL for one file of a public share.
    pub fn pickup_download_url(&self, code: &str, file_id: &str) -> String {
        format!(
            "{}/public/pickup/{}/files/{}/download",
            self.base_url,
            segment(code),
            segment(file_id)
        )
    }

    /// Download URL for one of the caller's own files.
    pub fn file_download_url(&self, file_id: &str) -> String {
        format!("{}/files/{}/download", self.base_url, segment(file_id))
    }

    /// Creation endpoint of the tus server.
    pub fn tus_endpoint(&self) -> String {
        format!("{}{}", self.base_url, TUS_UPLOAD_PATH)
    }

    /// Streams `url` into `dest`, returning the number of bytes written.
    ///
    /// No overall timeout applies; large files may take a while.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64, ApiError> {
        let mut req = self.http.get(url);
        if let Some(auth) = self.auth_header()? {
            req = req.header(AUTHORIZATION, auth);
        }
        let mut resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status.as_u16(), &body));
        }

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        info!(url, bytes = written, dest = %dest.display(), "download complete");
        Ok(written)
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    /// Server root: the base URL without its trailing `/api`.
    fn root_url(&self) -> &str {
        self.base_url
            .strip_suffix("/api")
            .unwrap_or(&self.base_url)
    }

    fn auth_header(&self) -> Result<Option<HeaderValue>, ApiError> {
        self.token
            .as_ref()
            .map(|t| HeaderValue::from_str(&format!("Bearer {t}")).map_err(|_| ApiError::InvalidToken))
            .transpose()
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, url).timeout(self.timeout);
        if let Some(auth) = self.auth_header()? {
            req = req.header(AUTHORIZATION, auth);
        }
        Ok(req)
    }

    /// Sends a request and unwraps the envelope.
    async fn send(&self, req: RequestBuilder) -> Result<Envelope, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            debug!(status = status.as_u16(), "request rejected");
            return Err(ApiError::from_response(status.as_u16(), &body));
        }
        if body.trim().is_empty() {
            return Ok(Envelope {
                code: 0,
                message: String::new(),
                data: None,
                error: None,
            });
        }

        let envelope: Envelope = serde_json::from_str(&body)?;
        if !envelope.is_ok() {
            debug!(code = envelope.code, "envelope reported failure");
            return Err(ApiError::from_response(status.as_u16(), &body));
        }
        Ok(envelope)
    }

    /// Sends a request and decodes the envelope payload.
    async fn call<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        self.send(req)
            .await?
            .parse_data::<T>()?
            .ok_or(ApiError::EmptyPayload)
    }
}

fn segment(s: &str) -> String {
    utf8_percent_encode(s, SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Reads one HTTP request (headers plus `Content-Length` body).
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut tmp = [0u8; 4096];
        loop {
            let n = stream.read(&mut tmp).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&tmp[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let len = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Starts a one-shot mock HTTP server. The handle yields the raw request.
    async fn mock_server(status: u16, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}/api");
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let resp = format!(
                "HTTP/1.1 {status} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(resp.as_bytes()).await;
            let _ = stream.shutdown().await;
            request
        });

        (url, handle)
    }

    fn body_of(request: &str) -> serde_json::Value {
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn login_returns_payload_and_posts_credentials() {
        let json = r#"{"code":0,"message":"Login successful","data":{
            "user_id":"u1","email":"a@b.c","role":"admin","token":"jwt","expires_in":86400}}"#;
        let (url, handle) = mock_server(200, json).await;

        let client = Client::new(&url).unwrap();
        let payload = client
            .login(&LoginRequest {
                email: "a@b.c".into(),
                password: "hunter22".into(),
                captcha_token: None,
            })
            .await
            .unwrap();
        assert_eq!(payload.token, "jwt");
        assert_eq!(payload.role.as_deref(), Some("admin"));

        let request = handle.await.unwrap();
        assert!(request.starts_with("POST /api/auth/login "));
        let body = body_of(&request);
        assert_eq!(body["email"], "a@b.c");
        assert!(body.get("captcha_token").is_none());
    }

    #[tokio::test]
    async fn bearer_token_is_attached() {
        let json = r#"{"code":0,"message":"ok","data":{"user_id":"u1","email":"a@b.c"}}"#;
        let (url, handle) = mock_server(200, json).await;

        let client = Client::new(&url).unwrap().with_bearer("tok-123");
        let user = client.current_user().await.unwrap();
        assert_eq!(user.role, "user");

        let request = handle.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /api/user/me "));
        assert!(request.contains("authorization: bearer tok-123"));
    }

    #[tokio::test]
    async fn no_token_no_authorization_header() {
        let json = r#"{"code":0,"message":"ok","data":{"items":[],"total":0,"page":1,"page_size":100}}"#;
        let (url, handle) = mock_server(200, json).await;

        let client = Client::new(&url).unwrap();
        client.list_files(1, 100, None).await.unwrap();

        let request = handle.await.unwrap().to_lowercase();
        assert!(!request.contains("authorization:"));
    }

    #[tokio::test]
    async fn list_files_sends_query() {
        let json = r#"{"code":0,"message":"ok","data":{"items":[
            {"id":"f1","filename":"a.txt","size":3,"mime_type":"text/plain","hash":"h",
             "created_at":"2026-02-05T03:00:00Z","is_shared":true,"share_count":2}
        ],"total":1,"page":1,"page_size":100}}"#;
        let (url, handle) = mock_server(200, json).await;

        let client = Client::new(&url).unwrap().with_bearer("t");
        let page = client.list_files(1, 100, Some("report")).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.items[0].is_shared);

        let request = handle.await.unwrap();
        assert!(request.starts_with("GET /api/files?page=1&page_size=100&search=report "));
    }

    #[tokio::test]
    async fn blank_search_is_omitted() {
        let json = r#"{"code":0,"message":"ok","data":{"items":[],"total":0,"page":1,"page_size":20}}"#;
        let (url, handle) = mock_server(200, json).await;

        let client = Client::new(&url).unwrap();
        client.list_files(1, 20, Some("   ")).await.unwrap();

        let request = handle.await.unwrap();
        assert!(request.starts_with("GET /api/files?page=1&page_size=20 "));
    }

    #[tokio::test]
    async fn lookup_share_success() {
        let json = r#"{"code":0,"message":"ok","data":{
            "share_id":"s1",
            "files":[{"file_id":"f1","filename":"a.txt","size":1024,"mime_type":"text/plain"}],
            "expires_at":"2026-02-06T03:00:00Z","remaining_downloads":9}}"#;
        let (url, handle) = mock_server(200, json).await;

        let client = Client::new(&url).unwrap();
        let info = client
            .lookup_share("ABCD2345", &LookupRequest::default())
            .await
            .unwrap();
        assert_eq!(info.files.len(), 1);
        assert_eq!(info.remaining_downloads, 9);

        let request = handle.await.unwrap();
        assert!(request.starts_with("POST /api/public/shares/ABCD2345 "));
        assert_eq!(body_of(&request), serde_json::json!({}));
    }

    #[tokio::test]
    async fn lookup_password_required() {
        let json = r#"{"code":4040,"message":"Password required"}"#;
        let (url, handle) = mock_server(403, json).await;

        let client = Client::new(&url).unwrap();
        let err = client
            .lookup_share("ABCD2345", &LookupRequest::default())
            .await
            .unwrap_err();
        assert!(err.is_password_required());
        assert_eq!(err.status(), Some(403));

        handle.abort();
    }

    #[tokio::test]
    async fn success_status_with_error_code_is_an_error() {
        let json = r#"{"code":4040,"message":"Password required"}"#;
        let (url, handle) = mock_server(200, json).await;

        let client = Client::new(&url).unwrap();
        let err = client
            .lookup_share("ABCD2345", &LookupRequest::default())
            .await
            .unwrap_err();
        assert!(err.is_password_required());
        assert_eq!(err.status(), Some(200));

        handle.abort();
    }

    #[tokio::test]
    async fn api_error_without_envelope() {
        let (url, handle) = mock_server(500, "internal").await;

        let client = Client::new(&url).unwrap().with_bearer("t");
        let err = client.delete_file("f1").await.unwrap_err();
        assert_eq!(err.code(), Some(500));
        assert_eq!(err.to_string(), "Request failed with status 500");

        handle.abort();
    }

    #[tokio::test]
    async fn missing_data_is_empty_payload() {
        let (url, handle) = mock_server(200, r#"{"code":0,"message":"ok"}"#).await;

        let client = Client::new(&url).unwrap().with_bearer("t");
        let err = client.current_user().await.unwrap_err();
        assert!(matches!(err, ApiError::EmptyPayload));

        handle.abort();
    }

    #[tokio::test]
    async fn create_share_omits_empty_password() {
        let json = r#"{"code":0,"message":"ok","data":{
            "share_id":"s1","pickup_code":"ABCD2345","expires_at":"2026-02-06T03:00:00Z"}}"#;
        let (url, handle) = mock_server(200, json).await;

        let client = Client::new(&url).unwrap().with_bearer("t");
        let share = client
            .create_share(&CreateShareRequest {
                file_ids: vec!["f1".into()],
                expires_in: 86_400,
                max_downloads: 10,
                password: None,
            })
            .await
            .unwrap();
        assert_eq!(share.pickup_code, "ABCD2345");

        let body = body_of(&handle.await.unwrap());
        assert_eq!(body["max_downloads"], 10);
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn stop_share_uses_delete() {
        let (url, handle) = mock_server(200, r#"{"code":0,"message":"Share stopped"}"#).await;

        let client = Client::new(&url).unwrap().with_bearer("t");
        client.stop_share("s1").await.unwrap();

        let request = handle.await.unwrap();
        assert!(request.starts_with("DELETE /api/shares/s1 "));
    }

    #[tokio::test]
    async fn save_to_vault_returns_ids() {
        let json = r#"{"code":0,"message":"ok","data":{"saved_ids":["n1","n2"]}}"#;
        let (url, handle) = mock_server(200, json).await;

        let client = Client::new(&url).unwrap().with_bearer("t");
        let saved = client
            .save_to_vault(
                "ABCD2345",
                &SaveToVaultRequest {
                    file_ids: vec!["f1".into(), "f2".into()],
                    password: Some("pw".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.saved_ids, vec!["n1", "n2"]);

        let request = handle.await.unwrap();
        assert!(request.starts_with("POST /api/shares/ABCD2345/save "));
    }

    #[tokio::test]
    async fn health_hits_server_root() {
        let (url, handle) = mock_server(200, r#"{"status":"ok"}"#).await;

        let client = Client::new(&url).unwrap();
        let health = client.health().await.unwrap();
        assert!(health.is_ok());

        let request = handle.await.unwrap();
        assert!(request.starts_with("GET /health "));
    }

    #[tokio::test]
    async fn download_streams_to_file() {
        let (url, handle) = mock_server(200, "file-contents").await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("a.txt");

        let client = Client::new(&url).unwrap();
        let download_url = client.pickup_download_url("ABCD2345", "f1");
        let n = client.download(&download_url, &dest).await.unwrap();
        assert_eq!(n, 13);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "file-contents");

        let request = handle.await.unwrap();
        assert!(request.starts_with("GET /api/public/pickup/ABCD2345/files/f1/download "));
    }

    #[tokio::test]
    async fn download_error_status() {
        let (url, handle) =
            mock_server(410, r#"{"code":410,"message":"Share has expired"}"#).await;
        let dir = tempfile::tempdir().unwrap();

        let client = Client::new(&url).unwrap();
        let err = client
            .download(&client.file_download_url("f1"), &dir.path().join("x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Share has expired");
        assert!(!dir.path().join("x").exists());

        handle.abort();
    }

    #[test]
    fn urls_are_built_from_base() {
        let client = Client::new("http://example.com/api/").unwrap();
        assert_eq!(client.base_url(), "http://example.com/api");
        assert_eq!(client.tus_endpoint(), "http://example.com/api/tus/upload");
        assert_eq!(
            client.file_download_url("f 1"),
            "http://example.com/api/files/f%201/download"
        );
        assert_eq!(client.root_url(), "http://example.com");
    }

    #[test]
    fn root_url_without_api_suffix() {
        let client = Client::new("http://example.com/v1").unwrap();
        assert_eq!(client.root_url(), "http://example.com/v1");
    }

    #[test]
    fn invalid_token_rejected() {
        let client = Client::new("http://example.com/api")
            .unwrap()
            .with_bearer("bad\ntoken");
        assert!(matches!(
            client.request(Method::GET, "/user/me"),
            Err(ApiError::InvalidToken)
        ));
    }

    #[test]
    fn token_can_be_cleared() {
        let mut client = Client::local().unwrap().with_bearer("t");
        assert_eq!(client.token(), Some("t"));
        client.set_token(None);
        assert!(client.token().is_none());
    }
}
