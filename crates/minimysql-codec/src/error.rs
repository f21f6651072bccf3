//! Codec error types.

use thiserror::Error;

/// Errors that can occur in the framing layer.
#[derive(Debug, Error)]
pub enum CodecError {
    /// IO error on the underlying stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The per-packet deadline expired.
    #[error("read timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The stream closed mid-packet.
    #[error("connection closed")]
    ConnectionClosed,

    /// An outgoing payload exceeded the transmission bound.
    #[error("write too large: {size} bytes (max {max})")]
    WriteTooLarge {
        /// Payload size requested.
        size: usize,
        /// Maximum allowed payload size.
        max: usize,
    },

    /// Protocol-level failure (oversize declaration, malformed header).
    #[error("protocol error: {0}")]
    Protocol(#[from] mysql_wire::ProtocolError),
}

impl CodecError {
    /// Whether this failure left the transport in an unusable state.
    ///
    /// Every codec failure is terminal for the current connection attempt;
    /// this exists so callers can distinguish deadline expiry (which may be
    /// a clean stop when probing for trailing packets) from the rest.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
