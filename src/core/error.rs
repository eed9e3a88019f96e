//! Error types for the SDK.
//!
//! Every fallible operation fails with an [`SdkError`] carrying exactly one
//! [`ErrorKind`]. Both transports collapse their native failure vocabularies
//! into these four kinds, so calling code can branch on the kind without
//! knowing which transport produced the error.
//!
//! The library never panics; all errors are returned as `Result` values.

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Boxed lower-level cause attached to an [`SdkError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Coarse semantic category of an [`SdkError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Dial, DNS or network failure, or the service reported itself unreachable.
    Connection,
    /// The deadline elapsed, the call was cancelled, or the service timed out.
    Timeout,
    /// The caller supplied invalid input, locally detected or remotely reported.
    Validation,
    /// The service failed or answered with an unexpected status.
    Service,
}

impl ErrorKind {
    /// Returns the machine-readable code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connection => "connection_error",
            Self::Timeout => "timeout",
            Self::Validation => "validation_error",
            Self::Service => "service_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The error type for all SDK operations.
///
/// The kind is fixed at construction. The optional cause is exposed through
/// [`std::error::Error::source`], so diagnostic tooling can walk down to the
/// root failure without losing the semantic kind.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct SdkError {
    kind: ErrorKind,
    message: String,
    status_code: Option<u16>,
    #[source]
    source: Option<BoxError>,
}

impl SdkError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            source: None,
        }
    }

    /// Creates a `Connection` error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    /// Creates a `Timeout` error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Creates a `Validation` error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Creates a `Service` error carrying the transport status code.
    pub fn service(message: impl Into<String>, status_code: u16) -> Self {
        let mut err = Self::new(ErrorKind::Service, message);
        err.status_code = Some(status_code);
        err
    }

    /// Attaches the lower-level cause.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the human-readable message.
    ///
    /// Messages are for logs only and are not a stable contract.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the transport-native status code, if one was observed.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Returns `true` for `Connection` errors.
    pub fn is_connection(&self) -> bool {
        self.kind == ErrorKind::Connection
    }

    /// Returns `true` for `Timeout` errors.
    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    /// Returns `true` for `Validation` errors.
    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }

    /// Returns `true` for `Service` errors.
    pub fn is_service(&self) -> bool {
        self.kind == ErrorKind::Service
    }

    /// Finds the first `SdkError` in `err`'s cause chain.
    ///
    /// `std::io::Error` hides its custom payload from `source()`, so the
    /// payload is inspected explicitly at each link.
    pub fn find<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a SdkError> {
        let mut current = Some(err);
        while let Some(e) = current {
            if let Some(sdk) = e.downcast_ref::<SdkError>() {
                return Some(sdk);
            }
            if let Some(inner) = e
                .downcast_ref::<std::io::Error>()
                .and_then(|io| io.get_ref())
            {
                if let Some(sdk) = SdkError::find(inner) {
                    return Some(sdk);
                }
            }
            current = e.source();
        }
        None
    }
}

fn has_kind(err: &(dyn StdError + 'static), kind: ErrorKind) -> bool {
    SdkError::find(err).is_some_and(|e| e.kind == kind)
}

/// Reports whether `err` is, or wraps, a connection error.
pub fn is_connection_error(err: &(dyn StdError + 'static)) -> bool {
    has_kind(err, ErrorKind::Connection)
}

/// Reports whether `err` is, or wraps, a timeout error.
pub fn is_timeout_error(err: &(dyn StdError + 'static)) -> bool {
    has_kind(err, ErrorKind::Timeout)
}

/// Reports whether `err` is, or wraps, a validation error.
pub fn is_validation_error(err: &(dyn StdError + 'static)) -> bool {
    has_kind(err, ErrorKind::Validation)
}

/// Reports whether `err` is, or wraps, a service error.
pub fn is_service_error(err: &(dyn StdError + 'static)) -> bool {
    has_kind(err, ErrorKind::Service)
}

/// A specialized `Result` type for SDK operations.
pub type Result<T> = std::result::Result<T, SdkError>;
