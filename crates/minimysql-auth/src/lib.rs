//! # minimysql-auth
//!
//! Authentication plugins for MySQL connections, isolated from the
//! connection logic.
//!
//! ## Supported Plugins
//!
//! | Plugin | Scramble | Notes |
//! |--------|----------|-------|
//! | `mysql_native_password` | SHA-1, 20 bytes | Legacy default (MySQL < 8.0) |
//! | `caching_sha2_password` | SHA-256, 32 bytes | MySQL 8.0+ default; may require full auth |
//! | `sha256_password` | RSA-encrypted | Always full auth |
//!
//! The SHA-256 family plugins fall back to a second round trip when the
//! server does not have the account cached: over TLS the password goes out
//! as a NUL-terminated plaintext packet, over a plain channel it is XOR
//! masked and RSA encrypted with the server's public key.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod credentials;
pub mod error;
pub mod scheme;
pub mod scramble;
pub mod server_key;

pub use credentials::Credentials;
pub use error::AuthError;
pub use scheme::{continuation, AuthScheme};
pub use scramble::{caching_sha2_scramble, native_password_scramble, xor_password_with_seed};
pub use server_key::encrypt_password_with_server_key;
