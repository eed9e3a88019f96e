//! Wire messages and client stub for the `clamav.ClamAVScanner` service.
//!
//! ```proto
//! syntax = "proto3";
//! package clamav;
//!
//! service ClamAVScanner {
//!   rpc HealthCheck(HealthCheckRequest) returns (HealthCheckResponse);
//!   rpc ScanFile(ScanFileRequest) returns (ScanResponse);
//!   rpc ScanStream(stream ScanStreamRequest) returns (ScanResponse);
//!   rpc ScanMultiple(stream ScanStreamRequest) returns (stream ScanResponse);
//! }
//! ```

use tonic::codec::{ProstCodec, Streaming};
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;
use tonic::{IntoRequest, IntoStreamingRequest, Response, Status};

/// Empty health check request.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct HealthCheckRequest {}

/// Health check response. The service reports `"healthy"` when operational.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HealthCheckResponse {
    /// Service status string.
    #[prost(string, tag = "1")]
    pub status: ::prost::alloc::string::String,
    /// Human-readable detail.
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
}

/// Unary scan of a complete payload.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ScanFileRequest {
    /// File contents.
    #[prost(bytes = "vec", tag = "1")]
    pub data: ::prost::alloc::vec::Vec<u8>,
    /// Filename echoed in the response.
    #[prost(string, tag = "2")]
    pub filename: ::prost::alloc::string::String,
}

/// Verdict for one scanned file.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ScanResponse {
    /// `OK`, `FOUND` or `ERROR`.
    #[prost(string, tag = "1")]
    pub status: ::prost::alloc::string::String,
    /// Signature name or error text.
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
    /// Scan duration in seconds.
    #[prost(double, tag = "3")]
    pub scan_time: f64,
    /// Filename the verdict belongs to.
    #[prost(string, tag = "4")]
    pub filename: ::prost::alloc::string::String,
}

/// One chunk of a streamed file.
///
/// The filename travels on the first chunk of each file only; `is_last`
/// marks the final chunk.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ScanStreamRequest {
    /// Chunk bytes, possibly empty.
    #[prost(bytes = "vec", tag = "1")]
    pub chunk: ::prost::alloc::vec::Vec<u8>,
    /// Filename, set on the first chunk of a file.
    #[prost(string, tag = "2")]
    pub filename: ::prost::alloc::string::String,
    /// Set on the final chunk of a file.
    #[prost(bool, tag = "3")]
    pub is_last: bool,
}

/// Client for the `clamav.ClamAVScanner` service over a tonic channel.
#[derive(Debug, Clone)]
pub struct ClamAvScannerClient {
    inner: tonic::client::Grpc<Channel>,
}

impl ClamAvScannerClient {
    /// Wraps an established (or lazily connecting) channel.
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    /// Limits the size of decoded response messages.
    pub fn max_decoding_message_size(mut self, limit: usize) -> Self {
        self.inner = self.inner.max_decoding_message_size(limit);
        self
    }

    /// Limits the size of encoded request messages.
    pub fn max_encoding_message_size(mut self, limit: usize) -> Self {
        self.inner = self.inner.max_encoding_message_size(limit);
        self
    }

    /// `rpc HealthCheck(HealthCheckRequest) returns (HealthCheckResponse)`
    pub async fn health_check(
        &mut self,
        request: impl IntoRequest<HealthCheckRequest>,
    ) -> Result<Response<HealthCheckResponse>, Status> {
        self.ready().await?;
        let path = PathAndQuery::from_static("/clamav.ClamAVScanner/HealthCheck");
        self.inner
            .unary(request.into_request(), path, ProstCodec::default())
            .await
    }

    /// `rpc ScanFile(ScanFileRequest) returns (ScanResponse)`
    pub async fn scan_file(
        &mut self,
        request: impl IntoRequest<ScanFileRequest>,
    ) -> Result<Response<ScanResponse>, Status> {
        self.ready().await?;
        let path = PathAndQuery::from_static("/clamav.ClamAVScanner/ScanFile");
        self.inner
            .unary(request.into_request(), path, ProstCodec::default())
            .await
    }

    /// `rpc ScanStream(stream ScanStreamRequest) returns (ScanResponse)`
    pub async fn scan_stream(
        &mut self,
        request: impl IntoStreamingRequest<Message = ScanStreamRequest>,
    ) -> Result<Response<ScanResponse>, Status> {
        self.ready().await?;
        let path = PathAndQuery::from_static("/clamav.ClamAVScanner/ScanStream");
        self.inner
            .client_streaming(request.into_streaming_request(), path, ProstCodec::default())
            .await
    }

    /// `rpc ScanMultiple(stream ScanStreamRequest) returns (stream ScanResponse)`
    pub async fn scan_multiple(
        &mut self,
        request: impl IntoStreamingRequest<Message = ScanStreamRequest>,
    ) -> Result<Response<Streaming<ScanResponse>>, Status> {
        self.ready().await?;
        let path = PathAndQuery::from_static("/clamav.ClamAVScanner/ScanMultiple");
        self.inner
            .streaming(request.into_streaming_request(), path, ProstCodec::default())
            .await
    }

    async fn ready(&mut self) -> Result<(), Status> {
        self.inner
            .ready()
            .await
            .map_err(|e| Status::unavailable(format!("service was not ready: {}", e)))
    }
}
