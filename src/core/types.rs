//! Core types used throughout the SDK.
//!
//! This module defines the value types both transports normalize into:
//! scan verdicts, health status and server version information.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Status tag of a scan verdict.
///
/// The service speaks in string tags (`"OK"`, `"FOUND"`, `"ERROR"`).
/// Unknown tags are preserved verbatim in [`ScanStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScanStatus {
    /// No threat was detected.
    Clean,
    /// A threat was detected; the verdict message names it.
    Infected,
    /// The service could not scan the payload.
    Error,
    /// A tag this client does not recognize.
    Other(String),
}

impl ScanStatus {
    /// Returns the wire tag for this status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Clean => "OK",
            Self::Infected => "FOUND",
            Self::Error => "ERROR",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for ScanStatus {
    fn from(tag: &str) -> Self {
        match tag {
            "OK" => Self::Clean,
            "FOUND" => Self::Infected,
            "ERROR" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ScanStatus {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

impl From<ScanStatus> for String {
    fn from(status: ScanStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The verdict of a single scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Verdict status.
    pub status: ScanStatus,

    /// Virus name if infected, diagnostic if error, empty if clean.
    #[serde(default)]
    pub message: String,

    /// Scan duration in seconds, as reported by the service.
    #[serde(rename = "time", default)]
    pub scan_time: f64,

    /// Name of the scanned file, echoed back when known.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "non_empty"
    )]
    pub filename: Option<String>,
}

fn non_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

impl ScanResult {
    /// Creates a verdict with the given status and message.
    pub fn new(status: ScanStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            scan_time: 0.0,
            filename: None,
        }
    }

    /// Creates an `Error` verdict, used for batch slots that failed locally.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ScanStatus::Error, message)
    }

    /// Sets the filename. Empty names are treated as absent.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        self.filename = (!filename.is_empty()).then_some(filename);
        self
    }

    /// Sets the scan time in seconds.
    pub fn with_scan_time(mut self, seconds: f64) -> Self {
        self.scan_time = seconds;
        self
    }

    /// Returns `true` if the file is clean.
    pub fn is_clean(&self) -> bool {
        self.status == ScanStatus::Clean
    }

    /// Returns `true` if the scan found a virus.
    pub fn is_infected(&self) -> bool {
        self.status == ScanStatus::Infected
    }

    /// Returns `true` if the service could not produce a verdict.
    pub fn is_error(&self) -> bool {
        self.status == ScanStatus::Error
    }
}

/// Health status of the scanning service.
///
/// `healthy` is derived by the client; each transport applies its own rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckResult {
    /// Whether the service is operational.
    pub healthy: bool,
    /// Raw status message from the service.
    pub message: String,
}

/// Version information of the API server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResult {
    /// Server version string.
    #[serde(default)]
    pub version: String,
    /// Commit hash of the server build.
    #[serde(default)]
    pub commit: String,
    /// Build timestamp.
    #[serde(rename = "build", default)]
    pub build_timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_status_round_trips_tags() {
        assert_eq!(ScanStatus::from("OK"), ScanStatus::Clean);
        assert_eq!(ScanStatus::from("FOUND"), ScanStatus::Infected);
        assert_eq!(ScanStatus::from("ERROR"), ScanStatus::Error);
        assert_eq!(
            ScanStatus::from("PENDING"),
            ScanStatus::Other("PENDING".into())
        );
        assert_eq!(ScanStatus::Other("PENDING".into()).to_string(), "PENDING");
    }

    #[test]
    fn test_scan_result_predicates() {
        let clean = ScanResult::new(ScanStatus::Clean, "");
        assert!(clean.is_clean());
        assert!(!clean.is_infected());

        let infected = ScanResult::new(ScanStatus::Infected, "Eicar-Test-Signature");
        assert!(infected.is_infected());
        assert!(!infected.is_clean());

        let error = ScanResult::error("clamd unavailable");
        assert!(!error.is_clean());
        assert!(!error.is_infected());
        assert!(error.is_error());
    }

    #[test]
    fn test_scan_result_decodes_service_json() {
        let result: ScanResult = serde_json::from_str(
            r#"{"status":"FOUND","message":"Eicar-Test-Signature","time":0.002342}"#,
        )
        .unwrap();

        assert!(result.is_infected());
        assert_eq!(result.message, "Eicar-Test-Signature");
        assert!((result.scan_time - 0.002342).abs() < f64::EPSILON);
        assert_eq!(result.filename, None);
    }

    #[test]
    fn test_empty_filename_decodes_as_absent() {
        let result: ScanResult =
            serde_json::from_str(r#"{"status":"OK","message":"","time":0.1,"filename":""}"#)
                .unwrap();
        assert_eq!(result.filename, None);
    }

    #[test]
    fn test_with_filename_ignores_empty() {
        assert_eq!(ScanResult::error("x").with_filename("").filename, None);
        assert_eq!(
            ScanResult::error("x").with_filename("a.txt").filename.as_deref(),
            Some("a.txt")
        );
    }

    #[test]
    fn test_version_decodes_build_field() {
        let version: VersionResult =
            serde_json::from_str(r#"{"version":"1.2.0","commit":"abc123","build":"2025-01-01"}"#)
                .unwrap();
        assert_eq!(version.version, "1.2.0");
        assert_eq!(version.commit, "abc123");
        assert_eq!(version.build_timestamp, "2025-01-01");
    }
}
