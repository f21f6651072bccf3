//! Client error types.

use thiserror::Error;

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// All TCP connect attempts failed.
    #[error("connect failed after {attempts} attempts")]
    ConnectRetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
    },

    /// Authentication failed.
    #[error("authentication failed: {0}")]
    Authentication(#[from] minimysql_auth::AuthError),

    /// TLS error.
    #[error("TLS error: {0}")]
    Tls(#[from] minimysql_tls::TlsError),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] mysql_wire::ProtocolError),

    /// Codec error.
    #[error("codec error: {0}")]
    Codec(#[from] minimysql_codec::CodecError),

    /// Server returned an error for a statement.
    #[error("server error {code}: {message}")]
    Server {
        /// Server error code.
        code: u16,
        /// Five-character SQLSTATE, when the server sent one.
        state: Option<String>,
        /// Error message.
        message: String,
    },

    /// Result-set methods were called out of order.
    #[error("invalid call sequence: {0}")]
    InvalidSequence(&'static str),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error is transient and may succeed on a new
    /// connection attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) | Self::ConnectRetriesExhausted { .. } | Self::Io(_) => true,
            Self::Codec(e) => {
                e.is_timeout() || matches!(e, minimysql_codec::CodecError::ConnectionClosed)
            }
            _ => false,
        }
    }

    /// Check if this error indicates a protocol/driver bug rather than a
    /// user or server condition.
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Check if this is a server error with a specific code.
    #[must_use]
    pub fn is_server_error(&self, code: u16) -> bool {
        matches!(self, Self::Server { code: c, .. } if *c == code)
    }
}

/// Convenience alias for results with the client error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::ConnectRetriesExhausted { attempts: 10 }.is_transient());
        assert!(Error::Codec(minimysql_codec::CodecError::Timeout(Duration::from_secs(6)))
            .is_transient());
        assert!(Error::Codec(minimysql_codec::CodecError::ConnectionClosed).is_transient());
        assert!(!Error::InvalidSequence("rows before columns").is_transient());
        assert!(!Error::Server {
            code: 1045,
            state: Some("28000".into()),
            message: "Access denied".into()
        }
        .is_transient());
    }

    #[test]
    fn test_server_error_code() {
        let err = Error::Server {
            code: 1064,
            state: Some("42000".into()),
            message: "syntax error".into(),
        };
        assert!(err.is_server_error(1064));
        assert!(!err.is_server_error(1045));
    }
}
