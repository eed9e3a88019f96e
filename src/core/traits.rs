//! Core traits for the SDK.
//!
//! This module defines the `Scanner` trait that both transport clients
//! implement, so application code can hold either behind one interface.

use crate::core::context::ScanContext;
use crate::core::error::Result;
use crate::core::types::{HealthCheckResult, ScanResult};

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

/// The transport-agnostic surface of a scanning client.
///
/// Implementations must be `Send + Sync`; a single client is shared by any
/// number of concurrent callers.
///
/// # Example
///
/// ```rust,ignore
/// use clamav_api_sdk::{ScanContext, Scanner};
///
/// async fn check_upload(scanner: &dyn Scanner, data: &[u8]) -> bool {
///     match scanner.scan_file(&ScanContext::new(), data, "upload.bin").await {
///         Ok(result) => result.is_clean(),
///         Err(_) => false,
///     }
/// }
/// ```
#[async_trait]
pub trait Scanner: Send + Sync + Debug {
    /// Returns the name of the transport, e.g. `"rest"` or `"grpc"`.
    fn name(&self) -> &str;

    /// Checks whether the service is operational.
    async fn health_check(&self, ctx: &ScanContext) -> Result<HealthCheckResult>;

    /// Scans an in-memory payload in a single request.
    async fn scan_file(&self, ctx: &ScanContext, data: &[u8], filename: &str)
        -> Result<ScanResult>;

    /// Reads a file from disk and scans it in a single request.
    ///
    /// An unreadable path is a `Validation` error and no request is made.
    async fn scan_file_path(&self, ctx: &ScanContext, path: &Path) -> Result<ScanResult>;
}

/// A shared, type-erased scanner.
pub type ArcScanner = Arc<dyn Scanner>;
