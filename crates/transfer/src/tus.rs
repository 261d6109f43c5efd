//! tus 1.0.0 core protocol over HTTP.
//!
//! Only the requests the uploader needs: creation (`POST`), offset probe
//! (`HEAD`) and append (`PATCH`).

use std::future::Future;
use std::pin::Pin;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderValue, LOCATION};
use reqwest::{Response, Url};
use tracing::debug;

use ahavault_protocol::constants::{REQUEST_TIMEOUT, TUS_RESUMABLE};

use crate::TransferError;

const TUS_RESUMABLE_HEADER: &str = "tus-resumable";
const UPLOAD_LENGTH: &str = "upload-length";
const UPLOAD_METADATA: &str = "upload-metadata";
const UPLOAD_OFFSET: &str = "upload-offset";
const OFFSET_OCTET_STREAM: &str = "application/offset+octet-stream";

/// Boxed future returned by [`TusTransport`] methods.
pub type TusFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransferError>> + Send + 'a>>;

/// The three tus requests an upload is made of.
///
/// Implemented over HTTP by [`HttpTusTransport`]; tests substitute an
/// in-memory server.
pub trait TusTransport: Send + Sync {
    /// Creation endpoint; part of the resume fingerprint.
    fn endpoint(&self) -> &str;

    /// Creates an upload of `length` bytes and returns its absolute URL.
    fn create<'a>(&'a self, length: u64, metadata: &'a [(String, String)]) -> TusFuture<'a, String>;

    /// Returns the offset the server has stored for `url`.
    fn offset<'a>(&'a self, url: &'a str) -> TusFuture<'a, u64>;

    /// Appends `data` at `offset` and returns the server's new offset.
    fn patch<'a>(&'a self, url: &'a str, offset: u64, data: Vec<u8>) -> TusFuture<'a, u64>;
}

/// Encodes `Upload-Metadata`: `key base64(value)` pairs joined by commas.
pub fn encode_metadata(metadata: &[(String, String)]) -> String {
    metadata
        .iter()
        .map(|(k, v)| format!("{k} {}", BASE64.encode(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// [`TusTransport`] backed by `reqwest`.
#[derive(Clone)]
pub struct HttpTusTransport {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpTusTransport {
    /// Creates a transport for the creation endpoint `endpoint`, attaching
    /// `token` as a bearer credential when present.
    pub fn new(endpoint: &str, token: Option<String>) -> Result<Self, TransferError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            token,
        })
    }

    fn base_headers(&self) -> Result<HeaderMap, TransferError> {
        let mut headers = HeaderMap::new();
        headers.insert(TUS_RESUMABLE_HEADER, HeaderValue::from_static(TUS_RESUMABLE));
        if let Some(token) = &self.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| TransferError::InvalidToken)?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Resolves a `Location` header against the creation endpoint.
    fn resolve_location(&self, location: &str) -> Result<String, TransferError> {
        let base = Url::parse(&self.endpoint)
            .map_err(|e| TransferError::Protocol(format!("invalid endpoint {}: {e}", self.endpoint)))?;
        let url = base
            .join(location)
            .map_err(|e| TransferError::Protocol(format!("invalid upload location {location}: {e}")))?;
        Ok(url.to_string())
    }

    async fn do_create(&self, length: u64, metadata: &[(String, String)]) -> Result<String, TransferError> {
        let mut headers = self.base_headers()?;
        headers.insert(UPLOAD_LENGTH, HeaderValue::from(length));
        if !metadata.is_empty() {
            let encoded = HeaderValue::from_str(&encode_metadata(metadata))
                .map_err(|e| TransferError::Protocol(format!("invalid upload metadata: {e}")))?;
            headers.insert(UPLOAD_METADATA, encoded);
        }

        let resp = self
            .http
            .post(&self.endpoint)
            .headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| TransferError::Protocol("server did not return an upload location".into()))?;
        let url = self.resolve_location(location)?;
        debug!("created upload {url} ({length} bytes)");
        Ok(url)
    }

    async fn do_offset(&self, url: &str) -> Result<u64, TransferError> {
        let mut headers = self.base_headers()?;
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

        let resp = self
            .http
            .head(url)
            .headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        upload_offset(&resp)
    }

    async fn do_patch(&self, url: &str, offset: u64, data: Vec<u8>) -> Result<u64, TransferError> {
        let mut headers = self.base_headers()?;
        headers.insert(UPLOAD_OFFSET, HeaderValue::from(offset));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(OFFSET_OCTET_STREAM));

        let len = data.len();
        let resp = self
            .http
            .patch(url)
            .headers(headers)
            .body(data)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let new_offset = upload_offset(&resp)?;
        debug!("patched {len} bytes at {offset}, server offset now {new_offset}");
        Ok(new_offset)
    }
}

impl TusTransport for HttpTusTransport {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn create<'a>(&'a self, length: u64, metadata: &'a [(String, String)]) -> TusFuture<'a, String> {
        Box::pin(self.do_create(length, metadata))
    }

    fn offset<'a>(&'a self, url: &'a str) -> TusFuture<'a, u64> {
        Box::pin(self.do_offset(url))
    }

    fn patch<'a>(&'a self, url: &'a str, offset: u64, data: Vec<u8>) -> TusFuture<'a, u64> {
        Box::pin(self.do_patch(url, offset, data))
    }
}

/// Maps non-2xx responses to [`TransferError::Status`].
async fn check_status(resp: Response) -> Result<Response, TransferError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = match body.trim() {
        "" => status.canonical_reason().unwrap_or("request failed").to_string(),
        text => text.to_string(),
    };
    Err(TransferError::Status {
        status: status.as_u16(),
        message,
    })
}

fn upload_offset(resp: &Response) -> Result<u64, TransferError> {
    resp.headers()
        .get(UPLOAD_OFFSET)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| TransferError::Protocol("missing or invalid Upload-Offset header".into()))
}
