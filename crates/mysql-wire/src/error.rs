//! Protocol error types.

use thiserror::Error;

/// Errors produced while encoding or decoding protocol structures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A structure was truncated before all required bytes were present.
    #[error("incomplete packet: expected {expected} bytes, got {actual}")]
    IncompletePacket {
        /// Bytes required.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// A packet declared a payload larger than the transmission bound.
    #[error("packet too large: {size} bytes (max {max})")]
    PacketTooLarge {
        /// Declared payload size.
        size: usize,
        /// Maximum allowed payload size.
        max: usize,
    },

    /// The first payload byte did not match any expected packet shape.
    #[error("unexpected packet type: {0:#04x}")]
    UnexpectedPacketType(u8),

    /// A result set declared more columns than the client supports.
    #[error("too many columns: {count} (max {max})")]
    TooManyColumns {
        /// Declared column count.
        count: usize,
        /// Maximum supported column count.
        max: usize,
    },

    /// A length-coded value pointed past the end of the buffer.
    #[error("length-coded value overruns buffer")]
    LengthCodedOverrun,

    /// Ran out of bytes in the middle of a structure.
    #[error("unexpected end of buffer")]
    UnexpectedEof,

    /// A string field contained invalid UTF-8.
    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),
}
