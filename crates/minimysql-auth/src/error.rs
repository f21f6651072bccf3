//! Authentication error types.

use thiserror::Error;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Server requested a plugin this client does not implement.
    #[error("unsupported authentication plugin: {0}")]
    UnsupportedPlugin(String),

    /// Server sent an empty or unusable scramble seed.
    #[error("authentication seed is empty")]
    EmptySeed,

    /// The server's RSA public key could not be parsed.
    #[error("invalid server public key: {0}")]
    InvalidServerKey(String),

    /// RSA encryption of the password failed.
    #[error("password encryption failed: {0}")]
    Encryption(String),

    /// Server sent an unrecognized continuation code during full auth.
    #[error("unexpected auth continuation code: {0:#04x}")]
    UnexpectedContinuation(u8),

    /// Server rejected the credentials with an ERROR packet.
    #[error("server rejected authentication (code {code}): {message}")]
    ServerRejected {
        /// Server error code.
        code: u16,
        /// Five-character SQLSTATE, when the server sent one.
        state: Option<String>,
        /// Human-readable message from the server.
        message: String,
    },

    /// Server sent a packet that fits no authentication stage.
    #[error("unexpected authentication response (first byte {0:#04x})")]
    UnexpectedResponse(u8),
}
