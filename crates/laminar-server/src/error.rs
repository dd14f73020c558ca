//! Server error types.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors returned while starting or running the host server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured bind address does not resolve.
    #[error("invalid address '{addr}': {source}")]
    InvalidAddress {
        /// The address as configured.
        addr: String,
        /// Resolution failure.
        #[source]
        source: io::Error,
    },

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that was tried.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// I/O error on the listener.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address_display() {
        let source = io::Error::new(io::ErrorKind::InvalidInput, "invalid socket address");
        let err = ServerError::InvalidAddress {
            addr: "nope".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("invalid address 'nope'"));
    }

    #[test]
    fn test_io_from() {
        let err: ServerError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert_eq!(err.to_string(), "I/O error: boom");
    }
}
