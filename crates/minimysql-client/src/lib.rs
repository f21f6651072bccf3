//! # minimysql-client
//!
//! A small async MySQL/MariaDB client for network-connected devices,
//! executing SQL directly against a remote server with no intermediary
//! service.
//!
//! The driver implements the text-protocol subset of the client wire
//! protocol: handshake and authentication (`mysql_native_password`,
//! `caching_sha2_password` with the fast/full-auth branches including RSA
//! key exchange, `sha256_password`), an optional mid-handshake TLS
//! upgrade, and streaming text result sets. Packet payloads are bounded
//! and the receive buffer grows to the largest packet seen, never
//! shrinking — the memory profile stays predictable on constrained
//! targets.
//!
//! ## Example
//!
//! ```rust,ignore
//! use minimysql_client::{Client, Config, Credentials, QueryResult};
//!
//! let config = Config::new("db.local", Credentials::new("app", "secret"));
//! let mut client = Client::connect(config).await?;
//!
//! match client.execute("SELECT id, name FROM devices").await? {
//!     QueryResult::ResultSet(mut set) => {
//!         set.columns().await?;
//!         while let Some(row) = set.next_row().await? {
//!             println!("{:?} {:?}", row.get(0), row.get(1));
//!         }
//!     }
//!     QueryResult::Summary(summary) => {
//!         println!("{} rows affected", summary.rows_affected);
//!     }
//! }
//!
//! client.close().await?;
//! ```
//!
//! ## Not Covered
//!
//! Connection pooling, the binary/prepared-statement protocol, multiple
//! concurrent result sets, and charset-aware text decoding are out of
//! scope; values are surfaced as the server's raw text.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod query;

pub use client::Client;
pub use config::{Config, TimeoutConfig, TlsMode};
pub use error::{Error, Result};
pub use query::{Column, QueryResult, QuerySummary, ResultSet, Row};

// Re-exports so callers need only this crate for common flows.
pub use minimysql_auth::Credentials;
pub use minimysql_tls::{TlsConfig, TlsVersion};
