//! gRPC status mapping.
//!
//! Translates `tonic::Status` codes into the SDK error taxonomy, and into
//! the HTTP status numbers used as `status_code` on `Service` errors.

use crate::core::SdkError;

use tonic::{Code, Status};

/// Maps a status received from the service onto an [`SdkError`].
///
/// A status synthesized by tonic from a local transport failure (one that
/// carries a source error and an unspecific code) is a `Connection` error.
pub(crate) fn map_status(status: Status) -> SdkError {
    let message = status.message().to_string();

    match status.code() {
        Code::InvalidArgument => SdkError::validation(message),
        Code::Internal => SdkError::service(message, 500),
        Code::DeadlineExceeded | Code::Cancelled => SdkError::timeout(message),
        Code::Unavailable => SdkError::connection(message),
        Code::Unknown if std::error::Error::source(&status).is_some() => {
            SdkError::connection(message)
        }
        code => {
            tracing::warn!(code = ?code, message = %message, "Unmapped gRPC status");
            SdkError::service(message, grpc_code_to_http(code))
        }
    }
    .with_source(status)
}

/// Returns the HTTP status conventionally associated with a gRPC code.
pub fn grpc_code_to_http(code: Code) -> u16 {
    match code {
        Code::Ok => 200,
        Code::InvalidArgument => 400,
        Code::Unauthenticated => 401,
        Code::PermissionDenied => 403,
        Code::NotFound => 404,
        Code::AlreadyExists => 409,
        Code::ResourceExhausted => 429,
        Code::Cancelled => 499,
        Code::Internal | Code::DataLoss | Code::Unknown => 500,
        Code::Unimplemented => 501,
        Code::Unavailable => 503,
        Code::DeadlineExceeded => 504,
        _ => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;
    use rstest::rstest;

    #[rstest]
    #[case(Code::InvalidArgument, ErrorKind::Validation, None)]
    #[case(Code::Internal, ErrorKind::Service, Some(500))]
    #[case(Code::DeadlineExceeded, ErrorKind::Timeout, None)]
    #[case(Code::Cancelled, ErrorKind::Timeout, None)]
    #[case(Code::Unavailable, ErrorKind::Connection, None)]
    #[case(Code::NotFound, ErrorKind::Service, Some(404))]
    #[case(Code::PermissionDenied, ErrorKind::Service, Some(403))]
    #[case(Code::ResourceExhausted, ErrorKind::Service, Some(429))]
    #[case(Code::Unimplemented, ErrorKind::Service, Some(501))]
    #[case(Code::Unknown, ErrorKind::Service, Some(500))]
    fn test_map_status(
        #[case] code: Code,
        #[case] kind: ErrorKind,
        #[case] status_code: Option<u16>,
    ) {
        let err = map_status(Status::new(code, "boom"));
        assert_eq!(err.kind(), kind);
        assert_eq!(err.message(), "boom");
        assert_eq!(err.status_code(), status_code);
    }

    #[rstest]
    #[case(Code::Ok, 200)]
    #[case(Code::InvalidArgument, 400)]
    #[case(Code::Unauthenticated, 401)]
    #[case(Code::PermissionDenied, 403)]
    #[case(Code::NotFound, 404)]
    #[case(Code::AlreadyExists, 409)]
    #[case(Code::ResourceExhausted, 429)]
    #[case(Code::Cancelled, 499)]
    #[case(Code::Internal, 500)]
    #[case(Code::DataLoss, 500)]
    #[case(Code::Unknown, 500)]
    #[case(Code::Unimplemented, 501)]
    #[case(Code::Unavailable, 503)]
    #[case(Code::DeadlineExceeded, 504)]
    #[case(Code::FailedPrecondition, 500)]
    #[case(Code::Aborted, 500)]
    #[case(Code::OutOfRange, 500)]
    fn test_grpc_code_to_http(#[case] code: Code, #[case] expected: u16) {
        assert_eq!(grpc_code_to_http(code), expected);
    }

    #[test]
    fn test_local_transport_failure_is_connection() {
        #[derive(Debug, thiserror::Error)]
        #[error("socket refused")]
        struct Refused;

        let status = Status::from_error(Box::new(Refused));
        assert_eq!(status.code(), Code::Unknown);

        let err = map_status(status);
        assert!(err.is_connection());
    }

    #[test]
    fn test_status_is_kept_as_source() {
        let err = map_status(Status::internal("scanner crashed"));
        let source = std::error::Error::source(&err).unwrap();
        let status = source.downcast_ref::<Status>().unwrap();
        assert_eq!(status.code(), Code::Internal);
    }
}
