//! REST transport.
//!
//! This module provides a client for the ClamAV API's HTTP/JSON endpoints.
//!
//! # Endpoints
//!
//! - `GET  /api/health-check` - `{message}`
//! - `GET  /api/version` - `{version, commit, build}`
//! - `POST /api/scan` - multipart form with one `file` part
//! - `POST /api/stream-scan` - raw `application/octet-stream` body with an exact length
//!
//! Non-2xx responses carry a JSON body with optional `status`/`message`
//! fields, mapped onto the error taxonomy by [`HttpFailure`].

use crate::core::input::{base_name, open_file, read_file};
use crate::core::{
    HealthCheckResult, Result, ScanContext, ScanResult, Scanner, SdkError, VersionResult,
};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{multipart, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::ReaderStream;

/// Default timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const PATH_HEALTH_CHECK: &str = "/api/health-check";
const PATH_VERSION: &str = "/api/version";
const PATH_SCAN: &str = "/api/scan";
const PATH_STREAM_SCAN: &str = "/api/stream-scan";

/// Placeholder name for multipart uploads without a filename.
const DEFAULT_FILENAME: &str = "file";

/// REST client configuration.
#[derive(Debug, Clone)]
pub struct RestClientConfig {
    /// Default timeout for every request.
    ///
    /// An earlier deadline on the [`ScanContext`] always wins.
    pub timeout: Duration,

    /// Headers sent with every request, e.g. authentication tokens.
    pub headers: HashMap<String, String>,

    /// Custom HTTP client (connection pool, proxies, TLS roots).
    pub http_client: Option<reqwest::Client>,
}

impl Default for RestClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            headers: HashMap::new(),
            http_client: None,
        }
    }
}

impl RestClientConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default request timeout. A zero duration is ignored.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.timeout = timeout;
        }
        self
    }

    /// Replaces the default headers with a copy of `headers`.
    pub fn with_headers(mut self, headers: &HashMap<String, String>) -> Self {
        self.headers = headers.clone();
        self
    }

    /// Adds a single default header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Uses a caller-supplied HTTP client.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

/// Client for the ClamAV API REST endpoints.
///
/// Safe for concurrent use; every call is self-contained.
///
/// # Example
///
/// ```rust,ignore
/// use clamav_api_sdk::backends::rest::{RestClient, RestClientConfig};
/// use clamav_api_sdk::ScanContext;
///
/// let client = RestClient::new("http://localhost:6000", RestClientConfig::default())?;
/// let result = client.scan_file(&ScanContext::new(), b"hello", "hello.txt").await?;
/// assert!(result.is_clean());
/// ```
#[derive(Debug)]
pub struct RestClient {
    base_url: String,
    timeout: Duration,
    headers: HeaderMap,
    http: RwLock<Option<reqwest::Client>>,
}

impl RestClient {
    /// Creates a REST client for the service at `base_url`.
    ///
    /// Trailing slashes are stripped. The address must carry a scheme and a
    /// host; anything else is a `Validation` error. No request is made.
    pub fn new(base_url: &str, config: RestClientConfig) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/');

        let url = Url::parse(base_url).map_err(|e| {
            SdkError::validation(format!("invalid base URL: {}", base_url)).with_source(e)
        })?;
        if url.host_str().map_or(true, str::is_empty) {
            return Err(SdkError::validation(format!(
                "base URL must include scheme and host: {}",
                base_url
            )));
        }

        let headers = header_map(&config.headers)?;

        let http = match config.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| {
                    SdkError::connection("failed to create HTTP client").with_source(e)
                })?,
        };

        tracing::info!(
            base_url = %base_url,
            timeout_ms = config.timeout.as_millis() as u64,
            "REST client created"
        );

        Ok(Self {
            base_url: base_url.to_string(),
            timeout: config.timeout,
            headers,
            http: RwLock::new(Some(http)),
        })
    }

    /// Returns the normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the default request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Releases the pooled connections.
    ///
    /// Closing twice is a no-op. Calls made after closing fail with a
    /// `Connection` error.
    pub fn close(&self) {
        let released = self
            .http
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if released.is_some() {
            tracing::info!(base_url = %self.base_url, "REST client closed");
        }
    }

    /// Checks whether the service is healthy.
    ///
    /// Healthy requires both HTTP 200 and the literal message `"ok"`.
    pub async fn health_check(&self, ctx: &ScanContext) -> Result<HealthCheckResult> {
        let request = self.request(Method::GET, PATH_HEALTH_CHECK)?;

        self.run(ctx, async move {
            let response = send(request).await?;
            let status = response.status();

            #[derive(Deserialize)]
            struct HealthBody {
                #[serde(default)]
                message: String,
            }

            let body: HealthBody = decode(response, "failed to decode health check response").await?;

            Ok(HealthCheckResult {
                healthy: status == StatusCode::OK && body.message == "ok",
                message: body.message,
            })
        })
        .await
    }

    /// Returns the server version information.
    pub async fn version(&self, ctx: &ScanContext) -> Result<VersionResult> {
        let request = self.request(Method::GET, PATH_VERSION)?;

        self.run(ctx, async move {
            let response = send(request).await?;
            if response.status() != StatusCode::OK {
                return Err(error_response(response).await);
            }
            decode(response, "failed to decode version response").await
        })
        .await
    }

    /// Scans an in-memory payload via multipart upload.
    pub async fn scan_file(
        &self,
        ctx: &ScanContext,
        data: &[u8],
        filename: &str,
    ) -> Result<ScanResult> {
        self.run(ctx, self.upload(data.to_vec(), filename)).await
    }

    /// Reads a file from disk and scans it via multipart upload.
    ///
    /// An unreadable path is a `Validation` error and no request is made.
    pub async fn scan_file_path(&self, ctx: &ScanContext, path: &Path) -> Result<ScanResult> {
        let data = read_file(path).await?;
        self.run(ctx, self.upload(data, base_name(path))).await
    }

    /// Buffers `reader` and scans it via multipart upload.
    pub async fn scan_reader<R>(
        &self,
        ctx: &ScanContext,
        mut reader: R,
        filename: &str,
    ) -> Result<ScanResult>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.run(ctx, async move {
            let mut data = Vec::new();
            reader
                .read_to_end(&mut data)
                .await
                .map_err(|e| SdkError::validation("failed to write file data").with_source(e))?;
            self.upload(data, filename).await
        })
        .await
    }

    /// Streams `reader` as a raw octet-stream body of exactly `size` bytes.
    ///
    /// The length must be known up front; callers with unknown-length
    /// sources buffer them first and use [`RestClient::stream_scan_bytes`]
    /// or [`RestClient::scan_file`]. A zero size is a `Validation` error.
    pub async fn stream_scan<R>(&self, ctx: &ScanContext, reader: R, size: u64) -> Result<ScanResult>
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        if size == 0 {
            return Err(SdkError::validation("size must be greater than 0"));
        }

        let body = reqwest::Body::wrap_stream(ReaderStream::new(reader.take(size)));
        let request = self
            .request(Method::POST, PATH_STREAM_SCAN)?
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, size)
            .body(body);

        tracing::debug!(endpoint = PATH_STREAM_SCAN, size, "Submitting stream scan");
        self.run(ctx, scan(request)).await
    }

    /// Scans an in-memory payload via the stream-scan endpoint.
    pub async fn stream_scan_bytes(&self, ctx: &ScanContext, data: Vec<u8>) -> Result<ScanResult> {
        if data.is_empty() {
            return Err(SdkError::validation("size must be greater than 0"));
        }

        tracing::debug!(endpoint = PATH_STREAM_SCAN, size = data.len(), "Submitting stream scan");
        let request = self
            .request(Method::POST, PATH_STREAM_SCAN)?
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data);
        self.run(ctx, scan(request)).await
    }

    /// Opens a file and streams it via the stream-scan endpoint.
    pub async fn stream_scan_file(&self, ctx: &ScanContext, path: &Path) -> Result<ScanResult> {
        let file = open_file(path).await?;
        let size = file
            .metadata()
            .await
            .map_err(|e| {
                SdkError::validation(format!("failed to stat file: {}", path.display())).with_source(e)
            })?
            .len();

        self.stream_scan(ctx, file, size).await
    }

    fn http(&self) -> Result<reqwest::Client> {
        self.http
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or_else(|| SdkError::connection("client is closed"))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = format!("{}{}", self.base_url, path);
        Ok(self.http()?.request(method, url).headers(self.headers.clone()))
    }

    /// Races `fut` against the context and the client timeout.
    async fn run<T>(&self, ctx: &ScanContext, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let deadline = ctx.earliest_deadline(self.timeout);
        ctx.run(deadline, fut).await
    }

    async fn upload(&self, data: Vec<u8>, filename: &str) -> Result<ScanResult> {
        let filename = if filename.is_empty() {
            DEFAULT_FILENAME
        } else {
            filename
        };

        tracing::debug!(endpoint = PATH_SCAN, filename, size = data.len(), "Submitting multipart scan");

        let part = multipart::Part::bytes(data).file_name(filename.to_string());
        let form = multipart::Form::new().part("file", part);
        let request = self.request(Method::POST, PATH_SCAN)?.multipart(form);

        scan(request).await
    }
}

#[async_trait]
impl Scanner for RestClient {
    fn name(&self) -> &str {
        "rest"
    }

    async fn health_check(&self, ctx: &ScanContext) -> Result<HealthCheckResult> {
        RestClient::health_check(self, ctx).await
    }

    async fn scan_file(&self, ctx: &ScanContext, data: &[u8], filename: &str) -> Result<ScanResult> {
        RestClient::scan_file(self, ctx, data, filename).await
    }

    async fn scan_file_path(&self, ctx: &ScanContext, path: &Path) -> Result<ScanResult> {
        RestClient::scan_file_path(self, ctx, path).await
    }
}

/// Non-success HTTP statuses the service is known to answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HttpFailure {
    BadRequest,
    PayloadTooLarge,
    ClientClosedRequest,
    BadGateway,
    GatewayTimeout,
    Unexpected(u16),
}

impl HttpFailure {
    pub(crate) fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            413 => Self::PayloadTooLarge,
            499 => Self::ClientClosedRequest,
            502 => Self::BadGateway,
            504 => Self::GatewayTimeout,
            other => Self::Unexpected(other),
        }
    }

    /// Maps the failure and the service message onto the error taxonomy.
    pub(crate) fn into_error(self, message: String) -> SdkError {
        match self {
            Self::BadRequest | Self::PayloadTooLarge => SdkError::validation(message),
            Self::ClientClosedRequest | Self::GatewayTimeout => SdkError::timeout(message),
            Self::BadGateway => SdkError::service(message, 502),
            Self::Unexpected(code) => {
                tracing::warn!(status = code, message = %message, "Unmapped HTTP status");
                SdkError::service(format!("unexpected status {}: {}", code, message), code)
            }
        }
    }
}

/// Builds the error for a non-success response body.
pub(crate) fn error_from_body(status: StatusCode, body: &[u8]) -> SdkError {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        status: String,
        #[serde(default)]
        message: String,
    }

    let code = status.as_u16();
    let body: ErrorBody = match serde_json::from_slice(body) {
        Ok(body) => body,
        Err(e) => {
            return SdkError::service(
                format!("unexpected status {} and failed to decode error response", code),
                code,
            )
            .with_source(e)
        }
    };

    let message = if body.message.is_empty() {
        body.status
    } else {
        body.message
    };

    HttpFailure::from_status(code).into_error(message)
}

async fn error_response(response: Response) -> SdkError {
    let status = response.status();
    match response.bytes().await {
        Ok(body) => error_from_body(status, &body),
        Err(e) => SdkError::service(
            format!("unexpected status {} and failed to read error response", status.as_u16()),
            status.as_u16(),
        )
        .with_source(e),
    }
}

/// Maps a failure where no HTTP response was obtained.
///
/// Unrecognized transport failures are `Connection` errors.
pub(crate) fn classify_transport_error(err: reqwest::Error) -> SdkError {
    if err.is_timeout() {
        SdkError::timeout("request timed out").with_source(err)
    } else if err.is_connect() {
        SdkError::connection("connection failed").with_source(err)
    } else {
        SdkError::connection("request failed").with_source(err)
    }
}

async fn send(request: RequestBuilder) -> Result<Response> {
    request.send().await.map_err(classify_transport_error)
}

async fn decode<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
    let status = response.status().as_u16();
    let body = response.bytes().await.map_err(classify_transport_error)?;
    serde_json::from_slice(&body)
        .map_err(|e| SdkError::service(context.to_string(), status).with_source(e))
}

async fn scan(request: RequestBuilder) -> Result<ScanResult> {
    let start = Instant::now();
    let response = send(request).await?;
    if response.status() != StatusCode::OK {
        return Err(error_response(response).await);
    }

    let result: ScanResult = decode(response, "failed to decode scan response").await?;
    tracing::debug!(
        status = %result.status,
        filename = ?result.filename,
        duration_ms = start.elapsed().as_millis() as u64,
        "Scan completed"
    );
    Ok(result)
}

fn header_map(headers: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            SdkError::validation(format!("invalid header name: {}", name)).with_source(e)
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            SdkError::validation(format!("invalid value for header {}", name)).with_source(e)
        })?;
        map.insert(name, value);
    }
    Ok(map)
}
