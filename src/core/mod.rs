//! Core types and traits shared by both transports.
//!
//! - [`error`] - The four-kind error taxonomy
//! - [`types`] - Scan verdicts, health and version results
//! - [`input`] - Named payloads for batch scans
//! - [`context`] - Per-call deadline and cancellation
//! - [`traits`] - The transport-agnostic `Scanner` trait

pub mod context;
pub mod error;
pub mod input;
pub mod traits;
pub mod types;

pub use context::ScanContext;
pub use error::{
    is_connection_error, is_service_error, is_timeout_error, is_validation_error, ErrorKind,
    Result, SdkError,
};
pub use input::FileInput;
pub use traits::{ArcScanner, Scanner};
pub use types::{HealthCheckResult, ScanResult, ScanStatus, VersionResult};
