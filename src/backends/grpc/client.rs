//! gRPC client for the `clamav.ClamAVScanner` service.

use super::batch::{self, ScanResults};
use super::chunk::{send_bytes, send_reader, ChunkError};
use super::config::GrpcClientConfig;
use super::proto::{ClamAvScannerClient, HealthCheckRequest, ScanFileRequest, ScanStreamRequest};
use super::status::map_status;
use crate::core::input::{base_name, open_file, read_file};
use crate::core::{
    FileInput, HealthCheckResult, Result, ScanContext, ScanResult, Scanner, SdkError,
};

use async_trait::async_trait;
use futures::StreamExt;
use std::future::Future;
use std::path::Path;
use std::sync::RwLock;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Endpoint;
use tonic::Response;

/// Outbound chunks buffered ahead of the transport on streaming calls.
const REQUEST_BUFFER: usize = 16;

/// Client for the ClamAV API gRPC service.
///
/// The connection is established lazily on the first call and shared by
/// every call made through the client. All operations are safe to run
/// concurrently.
///
/// # Example
///
/// ```rust,ignore
/// use clamav_api_sdk::backends::grpc::{GrpcClient, GrpcClientConfig};
/// use clamav_api_sdk::{FileInput, ScanContext};
/// use futures::StreamExt;
///
/// let client = GrpcClient::new("localhost:9000", GrpcClientConfig::default())?;
/// let mut results = client
///     .scan_multiple(&ScanContext::new(), vec![FileInput::from_path("a.pdf")])
///     .await?;
/// while let Some(result) = results.next().await {
///     println!("{:?}: {}", result.filename, result.status);
/// }
/// ```
#[derive(Debug)]
pub struct GrpcClient {
    target: String,
    config: GrpcClientConfig,
    stub: RwLock<Option<ClamAvScannerClient>>,
}

impl GrpcClient {
    /// Creates a client for the service at `target` (`host:port` or a URI).
    ///
    /// No connection is made until the first call. Must be called from
    /// within a Tokio runtime.
    pub fn new(target: &str, config: GrpcClientConfig) -> Result<Self> {
        if target.trim().is_empty() {
            return Err(SdkError::validation("target address is required"));
        }
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(SdkError::connection(
                "gRPC client must be created within a Tokio runtime",
            ));
        }

        let uri = endpoint_uri(target, config.uses_tls());
        let mut endpoint = Endpoint::from_shared(uri.clone()).map_err(|e| {
            SdkError::validation(format!("invalid target address: {}", target)).with_source(e)
        })?;

        if let Some(connect_timeout) = config.connect_timeout {
            endpoint = endpoint.connect_timeout(connect_timeout);
        }

        #[cfg(feature = "tls")]
        if let Some(tls) = config.tls.clone() {
            endpoint = endpoint.tls_config(tls).map_err(|e| {
                SdkError::validation("invalid TLS configuration").with_source(e)
            })?;
        }

        let stub = ClamAvScannerClient::new(endpoint.connect_lazy())
            .max_decoding_message_size(config.max_message_size)
            .max_encoding_message_size(config.max_message_size);

        tracing::info!(
            endpoint = %uri,
            tls = config.uses_tls(),
            chunk_size = config.chunk_size,
            "gRPC client created"
        );

        Ok(Self {
            target: uri,
            config,
            stub: RwLock::new(Some(stub)),
        })
    }

    /// Returns the normalized target URI.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &GrpcClientConfig {
        &self.config
    }

    /// Releases the client's handle on the connection.
    ///
    /// Calls already in flight keep their own handle and run to completion.
    /// Closing twice is a no-op; later calls fail with a `Connection` error.
    pub fn close(&self) {
        let released = self
            .stub
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if released.is_some() {
            tracing::info!(endpoint = %self.target, "gRPC client closed");
        }
    }

    /// Checks whether the service is healthy.
    ///
    /// Healthy iff the service reports status `"healthy"`.
    pub async fn health_check(&self, ctx: &ScanContext) -> Result<HealthCheckResult> {
        let deadline = ctx.deadline_or(self.config.timeout);
        let mut stub = self.stub()?;

        let response = ctx
            .run(deadline, async move {
                stub.health_check(timed(HealthCheckRequest {}, deadline))
                    .await
                    .map_err(map_status)
            })
            .await?
            .into_inner();

        Ok(HealthCheckResult {
            healthy: response.status == "healthy",
            message: response.message,
        })
    }

    /// Scans an in-memory payload in a single unary call.
    ///
    /// Empty data is a `Validation` error and no call is made.
    pub async fn scan_file(
        &self,
        ctx: &ScanContext,
        data: &[u8],
        filename: &str,
    ) -> Result<ScanResult> {
        if data.is_empty() {
            return Err(SdkError::validation("file data is required"));
        }

        let deadline = ctx.deadline_or(self.config.timeout);
        let mut stub = self.stub()?;
        let request = ScanFileRequest {
            data: data.to_vec(),
            filename: filename.to_string(),
        };

        tracing::debug!(filename, size = data.len(), "Submitting unary scan");

        let response = ctx
            .run(deadline, async move {
                stub.scan_file(timed(request, deadline))
                    .await
                    .map_err(map_status)
            })
            .await?;

        Ok(response.into_inner().into())
    }

    /// Reads a file from disk and scans it in a single unary call.
    pub async fn scan_file_path(&self, ctx: &ScanContext, path: &Path) -> Result<ScanResult> {
        let data = read_file(path).await?;
        self.scan_file(ctx, &data, base_name(path)).await
    }

    /// Scans an in-memory payload over a client-streaming call.
    ///
    /// The payload is split into chunks of the configured size; an empty
    /// payload is sent as a single empty final chunk.
    pub async fn scan_stream(
        &self,
        ctx: &ScanContext,
        data: &[u8],
        filename: &str,
    ) -> Result<ScanResult> {
        let chunk_size = self.config.chunk_size;
        tracing::debug!(filename, size = data.len(), chunk_size, "Submitting stream scan");

        self.stream_call(ctx, |tx| async move {
            settle(send_bytes(&tx, data, filename, chunk_size).await.map(|_| ()))
        })
        .await
    }

    /// Streams `reader` over a client-streaming call without buffering it whole.
    ///
    /// A read failure is a `Validation` error and aborts the call.
    pub async fn scan_stream_reader<R>(
        &self,
        ctx: &ScanContext,
        mut reader: R,
        filename: &str,
    ) -> Result<ScanResult>
    where
        R: AsyncRead + Unpin + Send,
    {
        let chunk_size = self.config.chunk_size;
        tracing::debug!(filename, chunk_size, "Submitting reader stream scan");

        self.stream_call(ctx, |tx| async move {
            settle(send_reader(&tx, &mut reader, filename, chunk_size).await.map(|_| ()))
        })
        .await
    }

    /// Opens a file and streams it over a client-streaming call.
    pub async fn scan_stream_file(&self, ctx: &ScanContext, path: &Path) -> Result<ScanResult> {
        let file = open_file(path).await?;
        self.scan_stream_reader(ctx, file, base_name(path)).await
    }

    /// Scans many files over one bidirectional stream.
    ///
    /// Results arrive as the service produces them. A file that cannot be
    /// read or sent yields an `ERROR` result carrying its filename; a
    /// session failure yields one final `ERROR` result. Failing to open the
    /// session is returned as an error. Dropping the returned stream
    /// cancels the session.
    pub async fn scan_multiple(
        &self,
        ctx: &ScanContext,
        files: Vec<FileInput>,
    ) -> Result<ScanResults> {
        let deadline = ctx.deadline_or(self.config.timeout);
        ctx.check(deadline)?;
        let mut stub = self.stub()?;

        batch::start(
            files,
            self.config.chunk_size,
            deadline,
            ctx.cancellation_token(),
            move |requests| async move {
                stub.scan_multiple(timed(requests, deadline))
                    .await
                    .map(Response::into_inner)
            },
        )
        .await
    }

    /// Scans many files and invokes `on_result` for each verdict.
    ///
    /// Returns once every result has been delivered or the batch ends.
    pub async fn scan_multiple_with<F>(
        &self,
        ctx: &ScanContext,
        files: Vec<FileInput>,
        mut on_result: F,
    ) -> Result<()>
    where
        F: FnMut(ScanResult) + Send,
    {
        let mut results = self.scan_multiple(ctx, files).await?;
        while let Some(result) = results.next().await {
            on_result(result);
        }
        Ok(())
    }

    fn stub(&self) -> Result<ClamAvScannerClient> {
        self.stub
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or_else(|| SdkError::connection("client is closed"))
    }

    /// Runs a client-streaming scan, feeding the request stream with `feed`.
    ///
    /// The call and the feed run concurrently; whichever fails first
    /// decides the error.
    async fn stream_call<F, Fut>(&self, ctx: &ScanContext, feed: F) -> Result<ScanResult>
    where
        F: FnOnce(mpsc::Sender<ScanStreamRequest>) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let deadline = ctx.deadline_or(self.config.timeout);
        let mut stub = self.stub()?;
        let (tx, rx) = mpsc::channel(REQUEST_BUFFER);

        let call = async move {
            stub.scan_stream(timed(ReceiverStream::new(rx), deadline))
                .await
                .map(Response::into_inner)
                .map_err(map_status)
        };
        let send = feed(tx);

        ctx.run(deadline, async move {
            let (response, ()) = futures::future::try_join(call, send).await?;
            Ok(response.into())
        })
        .await
    }
}

#[async_trait]
impl Scanner for GrpcClient {
    fn name(&self) -> &str {
        "grpc"
    }

    async fn health_check(&self, ctx: &ScanContext) -> Result<HealthCheckResult> {
        GrpcClient::health_check(self, ctx).await
    }

    async fn scan_file(&self, ctx: &ScanContext, data: &[u8], filename: &str) -> Result<ScanResult> {
        GrpcClient::scan_file(self, ctx, data, filename).await
    }

    async fn scan_file_path(&self, ctx: &ScanContext, path: &Path) -> Result<ScanResult> {
        GrpcClient::scan_file_path(self, ctx, path).await
    }
}

/// Prefixes a bare `host:port` with the scheme matching the transport.
fn endpoint_uri(target: &str, tls: bool) -> String {
    if target.contains("://") {
        target.to_string()
    } else if tls {
        format!("https://{}", target)
    } else {
        format!("http://{}", target)
    }
}

/// Wraps `message` in a request carrying the remaining budget as `grpc-timeout`.
fn timed<T>(message: T, deadline: Instant) -> tonic::Request<T> {
    let mut request = tonic::Request::new(message);
    request.set_timeout(deadline.saturating_duration_since(Instant::now()));
    request
}

/// A closed request stream means the call has ended; its status tells why.
fn settle(sent: std::result::Result<(), ChunkError>) -> Result<()> {
    match sent {
        Ok(()) | Err(ChunkError::Closed) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
