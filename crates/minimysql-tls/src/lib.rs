//! # minimysql-tls
//!
//! TLS channel upgrade for MySQL connections.
//!
//! MySQL negotiates TLS mid-handshake: after reading the server greeting,
//! the client sends an abbreviated SSLRequest packet and then replaces the
//! plain TCP stream with an encrypted one before sending its credentials.
//!
//! ```text
//! TCP Connect → Greeting (cleartext) → SSLRequest → TLS Handshake
//!             → Handshake Response (encrypted) → Auth (encrypted)
//! ```
//!
//! ## Security
//!
//! By default, this crate validates server certificates against the Mozilla
//! root certificate store with hostname verification. The
//! `trust_server_certificate` option disables validation but logs a warning;
//! it exists for lab setups with self-signed certificates.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod connector;
pub mod error;

pub use config::{TlsConfig, TlsVersion};
pub use connector::{default_tls_config, TlsConnector};
pub use error::TlsError;

// Re-export tokio-rustls stream type for convenience
pub use tokio_rustls::client::TlsStream;
