//! Authentication plugin identification.

use crate::error::AuthError;

/// Plugin name for SHA-1 based authentication (legacy default).
pub const MYSQL_NATIVE_PASSWORD: &str = "mysql_native_password";
/// Plugin name for SHA-256 based authentication (MySQL 8.0+ default).
pub const CACHING_SHA2_PASSWORD: &str = "caching_sha2_password";
/// Plugin name for RSA-based SHA-256 authentication.
pub const SHA256_PASSWORD: &str = "sha256_password";

/// Single-byte codes exchanged inside auth-more-data (`0x01`) packets
/// during the SHA-256 family continuation.
pub mod continuation {
    /// Client request for the server's RSA public key.
    pub const REQUEST_SERVER_KEY: u8 = 0x02;
    /// Fast auth succeeded; an OK packet follows.
    pub const FAST_AUTH_DONE: u8 = 0x03;
    /// Full auth required; the client must prove the password again.
    pub const FULL_AUTH_REQUIRED: u8 = 0x04;
}

/// Authentication plugin negotiated with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthScheme {
    /// `mysql_native_password`: SHA-1 challenge/response.
    NativePassword,
    /// `caching_sha2_password`: SHA-256 challenge/response with an
    /// optional full-auth continuation.
    CachingSha2,
    /// `sha256_password`: password sent RSA encrypted (or plaintext
    /// over TLS).
    Sha256Password,
}

impl AuthScheme {
    /// Resolve a plugin name from the server greeting or an auth switch.
    pub fn from_plugin_name(name: &str) -> Result<Self, AuthError> {
        match name {
            MYSQL_NATIVE_PASSWORD => Ok(Self::NativePassword),
            CACHING_SHA2_PASSWORD => Ok(Self::CachingSha2),
            SHA256_PASSWORD => Ok(Self::Sha256Password),
            other => Err(AuthError::UnsupportedPlugin(other.to_string())),
        }
    }

    /// The wire name of this plugin.
    #[must_use]
    pub fn plugin_name(&self) -> &'static str {
        match self {
            Self::NativePassword => MYSQL_NATIVE_PASSWORD,
            Self::CachingSha2 => CACHING_SHA2_PASSWORD,
            Self::Sha256Password => SHA256_PASSWORD,
        }
    }

    /// Whether this plugin can require a second, full-auth round trip.
    #[must_use]
    pub fn may_require_full_auth(&self) -> bool {
        matches!(self, Self::CachingSha2 | Self::Sha256Password)
    }
}

impl std::fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.plugin_name())
    }
}
