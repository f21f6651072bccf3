//! # mysql-wire
//!
//! Pure implementation of the client-side MySQL/MariaDB wire protocol.
//!
//! This crate provides packet framing structures, the length-coded binary
//! encoding, and the handshake/response/result-set codecs used by the
//! connection and query layers.
//!
//! ## Design Philosophy
//!
//! This crate is intentionally IO-agnostic. It contains no networking logic
//! and makes no assumptions about the async runtime. Higher-level crates
//! build upon this foundation to provide async I/O capabilities.
//!
//! The packet size bound ([`MAX_PACKET_PAYLOAD`]) is deliberately small: the
//! protocol subset implemented here targets memory-constrained embedded
//! clients, and every receive buffer is sized from packets actually seen.
//!
//! ## Example
//!
//! ```rust,ignore
//! use mysql_wire::{PacketHeader, PACKET_HEADER_LEN};
//!
//! let header = PacketHeader::new(32, 1);
//! let bytes = header.encode_to_bytes();
//! assert_eq!(bytes.len(), PACKET_HEADER_LEN);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod capability;
pub mod command;
pub mod error;
pub mod handshake;
pub mod lcb;
pub mod packet;
pub mod resultset;
pub mod response;

pub use capability::CapabilityFlags;
pub use command::Command;
pub use error::ProtocolError;
pub use handshake::{Handshake, HandshakeResponse, SslRequest, DEFAULT_CHARSET, SEED_LEN};
pub use lcb::{get_lenenc_bytes, get_lenenc_int, get_lenenc_str, put_lenenc_int};
pub use packet::{PacketHeader, MAX_PACKET_PAYLOAD, PACKET_HEADER_LEN};
pub use response::{ErrPacket, OkPacket, ServerResponse, AUTH_MORE_DATA_MARKER, EOF_MARKER, ERR_MARKER, OK_MARKER};
pub use resultset::{ColumnDefinition, decode_row, MAX_COLUMNS};
