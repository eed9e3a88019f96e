//! gRPC transport.
//!
//! A persistent, multiplexed connection to the `clamav.ClamAVScanner`
//! service with unary, client-streaming and bidirectional calls.
//!
//! - [`client`] - The [`GrpcClient`] and its operations
//! - [`config`] - Timeouts, chunk and message size limits, TLS
//! - [`proto`] - Wire messages and the service stub
//!
//! Chunking, batch orchestration and status mapping are internal.

mod batch;
mod chunk;
pub mod client;
pub mod config;
pub mod proto;
mod status;
#[cfg(test)]
mod test_server;

pub use batch::ScanResults;
pub use client::GrpcClient;
pub use config::{GrpcClientConfig, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_TIMEOUT};
pub use status::grpc_code_to_http;
