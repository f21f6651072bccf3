//! MySQL packet header definitions.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;

/// Packet header size in bytes: 3-byte length + 1-byte sequence id.
pub const PACKET_HEADER_LEN: usize = 4;

/// Maximum payload a single packet may declare.
///
/// Bounded well below the protocol's 16 MiB limit; this client targets
/// devices where the receive buffer must stay within a few kilobytes.
pub const MAX_PACKET_PAYLOAD: usize = 1500;

/// MySQL packet header.
///
/// Every packet begins with a 4-byte header: a 24-bit little-endian payload
/// length followed by a sequence id that increases per exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Payload length (excluding the header itself).
    pub length: usize,
    /// Packet sequence id (wraps at 255).
    pub sequence_id: u8,
}

impl PacketHeader {
    /// Create a new packet header.
    #[must_use]
    pub const fn new(length: usize, sequence_id: u8) -> Self {
        Self {
            length,
            sequence_id,
        }
    }

    /// Parse a packet header from bytes.
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        if src.remaining() < PACKET_HEADER_LEN {
            return Err(ProtocolError::IncompletePacket {
                expected: PACKET_HEADER_LEN,
                actual: src.remaining(),
            });
        }

        let b0 = src.get_u8() as usize;
        let b1 = src.get_u8() as usize;
        let b2 = src.get_u8() as usize;
        let sequence_id = src.get_u8();

        Ok(Self {
            length: b0 | (b1 << 8) | (b2 << 16),
            sequence_id,
        })
    }

    /// Encode the packet header to bytes.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u8((self.length & 0xff) as u8);
        dst.put_u8(((self.length >> 8) & 0xff) as u8);
        dst.put_u8(((self.length >> 16) & 0xff) as u8);
        dst.put_u8(self.sequence_id);
    }

    /// Encode the packet header to a new `Bytes` buffer.
    #[must_use]
    pub fn encode_to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(PACKET_HEADER_LEN);
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Check the declared payload length against the transmission bound.
    pub fn check_length(&self) -> Result<(), ProtocolError> {
        if self.length > MAX_PACKET_PAYLOAD {
            return Err(ProtocolError::PacketTooLarge {
                size: self.length,
                max: MAX_PACKET_PAYLOAD,
            });
        }
        Ok(())
    }

    /// Total framed size including the header.
    #[must_use]
    pub const fn total_len(&self) -> usize {
        self.length + PACKET_HEADER_LEN
    }
}
