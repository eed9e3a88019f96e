//! Transport clients.
//!
//! Both transports implement the [`Scanner`](crate::core::Scanner) trait
//! and share the result model and error taxonomy in [`core`](crate::core).
//!
//! ## Available Transports
//!
//! - [`rest`] - HTTP/JSON endpoints (requires `rest` feature)
//! - [`grpc`] - `clamav.ClamAVScanner` service with streaming (requires `grpc` feature)

#[cfg(feature = "rest")]
pub mod rest;

#[cfg(feature = "grpc")]
pub mod grpc;

// Re-exports
#[cfg(feature = "rest")]
pub use rest::{RestClient, RestClientConfig};

#[cfg(feature = "grpc")]
pub use grpc::{GrpcClient, GrpcClientConfig, ScanResults};
