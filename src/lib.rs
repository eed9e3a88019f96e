//! # ClamAV API SDK
//!
//! Async clients for the ClamAV API scanning service, over REST and gRPC.
//!
//! ## Overview
//!
//! The crate lets an application:
//!
//! - Check service health and query its version
//! - Submit in-memory payloads, readers or files for scanning
//! - Stream large files in chunks without buffering them whole (gRPC)
//! - Scan many files over one bidirectional stream, consuming verdicts as they arrive
//! - Classify failures into connection, timeout, validation and service errors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use clamav_api_sdk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RestClient::new("http://localhost:6000", RestClientConfig::default())?;
//!
//!     let result = client
//!         .scan_file(&ScanContext::new(), b"file content", "upload.txt")
//!         .await?;
//!
//!     if result.is_infected() {
//!         println!("Threat found: {}", result.message);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `default` - Both transports
//! - `rest` - REST client via `reqwest`
//! - `grpc` - gRPC client via `tonic`
//! - `tls` - TLS credentials for the gRPC client
//!
//! ## Architecture
//!
//! - **Core**: Result model, error taxonomy, call context and the `Scanner` trait
//! - **Backends**: The REST and gRPC transport clients

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod backends;
pub mod core;

// Re-export commonly used types at the crate root
pub use crate::core::{
    is_connection_error, is_service_error, is_timeout_error, is_validation_error, ArcScanner,
    ErrorKind, FileInput, HealthCheckResult, Result, ScanContext, ScanResult, ScanStatus,
    Scanner, SdkError, VersionResult,
};

#[cfg(feature = "rest")]
pub use crate::backends::{RestClient, RestClientConfig};

#[cfg(feature = "grpc")]
pub use crate::backends::{GrpcClient, GrpcClientConfig, ScanResults};

/// Prelude module for convenient imports.
///
/// ```rust
/// use clamav_api_sdk::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{
        ErrorKind, FileInput, HealthCheckResult, ScanContext, ScanResult, ScanStatus, Scanner,
        SdkError, VersionResult,
    };

    #[cfg(feature = "rest")]
    pub use crate::backends::{RestClient, RestClientConfig};

    #[cfg(feature = "grpc")]
    pub use crate::backends::{GrpcClient, GrpcClientConfig, ScanResults};
}
