//! gRPC client configuration.

use std::time::Duration;

#[cfg(feature = "tls")]
use tonic::transport::ClientTlsConfig;

/// Default per-call timeout when the context has no deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default streaming chunk size (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Default maximum message size in either direction (200 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 200 * 1024 * 1024;

/// Configuration for [`GrpcClient`](super::GrpcClient).
///
/// Zero values passed to the `with_*` methods are ignored and the previous
/// value is kept.
#[derive(Debug, Clone)]
pub struct GrpcClientConfig {
    /// Per-call timeout applied when the context carries no deadline.
    pub timeout: Duration,

    /// Maximum bytes per streamed chunk.
    pub chunk_size: usize,

    /// Maximum encoded or decoded message size.
    pub max_message_size: usize,

    /// Timeout for establishing the underlying connection.
    pub connect_timeout: Option<Duration>,

    /// TLS transport credentials. Plaintext when unset.
    #[cfg(feature = "tls")]
    pub tls: Option<ClientTlsConfig>,
}

impl Default for GrpcClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            connect_timeout: None,
            #[cfg(feature = "tls")]
            tls: None,
        }
    }
}

impl GrpcClientConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.timeout = timeout;
        }
        self
    }

    /// Sets the streaming chunk size in bytes.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        if chunk_size > 0 {
            self.chunk_size = chunk_size;
        }
        self
    }

    /// Sets the maximum message size in bytes.
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        if max_message_size > 0 {
            self.max_message_size = max_message_size;
        }
        self
    }

    /// Sets the connection establishment timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.connect_timeout = Some(timeout);
        }
        self
    }

    /// Enables TLS with the given client configuration.
    #[cfg(feature = "tls")]
    pub fn with_tls(mut self, tls: ClientTlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    pub(crate) fn uses_tls(&self) -> bool {
        #[cfg(feature = "tls")]
        {
            self.tls.is_some()
        }
        #[cfg(not(feature = "tls"))]
        {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GrpcClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.chunk_size, 65_536);
        assert_eq!(config.max_message_size, 209_715_200);
        assert!(config.connect_timeout.is_none());
        assert!(!config.uses_tls());
    }

    #[test]
    fn test_zero_values_are_ignored() {
        let config = GrpcClientConfig::new()
            .with_timeout(Duration::ZERO)
            .with_chunk_size(0)
            .with_max_message_size(0)
            .with_connect_timeout(Duration::ZERO);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
        assert!(config.connect_timeout.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = GrpcClientConfig::new()
            .with_timeout(Duration::from_secs(5))
            .with_chunk_size(1024)
            .with_max_message_size(4 * 1024 * 1024)
            .with_connect_timeout(Duration::from_secs(2));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.max_message_size, 4 * 1024 * 1024);
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(2)));
    }
}
