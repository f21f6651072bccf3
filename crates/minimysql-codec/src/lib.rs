//! # minimysql-codec
//!
//! Async framing layer for MySQL packet handling.
//!
//! This crate turns any `AsyncRead + AsyncWrite` byte stream into a
//! sequence of protocol packets: a 3-byte little-endian length, a
//! sequence id, and a bounded payload.
//!
//! ## Buffer discipline
//!
//! [`PacketStream`] owns one receive buffer per connection. The buffer
//! grows to the high-water mark of all packets seen (`length + 4`) and
//! never shrinks, and exactly one packet occupies it at a time — there is
//! no read-ahead and no pipelining. This is the contract the rest of the
//! client relies on for bounded memory on embedded targets.
//!
//! ## TLS upgrade
//!
//! The same `PacketStream` code serves plaintext and TLS transports via
//! the type parameter. [`PacketStream::into_parts`] releases the inner
//! stream for the TLS handshake while preserving the buffer and sequence
//! state, which [`PacketStream::from_parts`] then re-attaches.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod packet_stream;

pub use error::CodecError;
pub use packet_stream::{PacketStream, StreamParts};
