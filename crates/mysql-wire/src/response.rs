//! Server response packet classification and decoding.

use bytes::Buf;

use crate::error::ProtocolError;
use crate::lcb::get_lenenc_int;

/// First payload byte of an OK packet.
pub const OK_MARKER: u8 = 0x00;

/// First payload byte of an EOF packet (payload length at most 5).
pub const EOF_MARKER: u8 = 0xfe;

/// First payload byte of an ERROR packet.
pub const ERR_MARKER: u8 = 0xff;

/// First payload byte of an authentication continuation packet.
pub const AUTH_MORE_DATA_MARKER: u8 = 0x01;

/// Decoded OK packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OkPacket {
    /// Rows affected by the statement.
    pub affected_rows: u64,
    /// Last insert id generated by the statement.
    pub last_insert_id: u64,
    /// Server status flags.
    pub status_flags: u16,
    /// Warning count.
    pub warnings: u16,
}

impl OkPacket {
    /// Decode an OK payload (marker byte included).
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        if !src.has_remaining() {
            return Err(ProtocolError::UnexpectedEof);
        }

        let marker = src.get_u8();
        if marker != OK_MARKER && marker != EOF_MARKER {
            return Err(ProtocolError::UnexpectedPacketType(marker));
        }

        let affected_rows = get_lenenc_int(src)?.unwrap_or(0);
        let last_insert_id = get_lenenc_int(src)?.unwrap_or(0);

        let status_flags = if src.remaining() >= 2 { src.get_u16_le() } else { 0 };
        let warnings = if src.remaining() >= 2 { src.get_u16_le() } else { 0 };

        Ok(Self {
            affected_rows,
            last_insert_id,
            status_flags,
            warnings,
        })
    }
}

/// Decoded ERROR packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrPacket {
    /// Server error code.
    pub code: u16,
    /// Five-character SQL state, when the '#' marker is present.
    pub sql_state: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl ErrPacket {
    /// Decode an ERROR payload (marker byte included).
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        if src.remaining() < 3 {
            return Err(ProtocolError::UnexpectedEof);
        }

        let marker = src.get_u8();
        if marker != ERR_MARKER {
            return Err(ProtocolError::UnexpectedPacketType(marker));
        }

        let code = src.get_u16_le();

        let mut rest = vec![0u8; src.remaining()];
        src.copy_to_slice(&mut rest);

        let (sql_state, message_bytes) = if rest.first() == Some(&b'#') && rest.len() >= 6 {
            let state = String::from_utf8(rest[1..6].to_vec())
                .map_err(|_| ProtocolError::InvalidUtf8("sql state"))?;
            (Some(state), &rest[6..])
        } else {
            (None, &rest[..])
        };

        let message = String::from_utf8_lossy(message_bytes).into_owned();

        Ok(Self {
            code,
            sql_state,
            message,
        })
    }
}

/// Response classification by first payload byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerResponse {
    /// OK packet.
    Ok,
    /// ERROR packet.
    Err,
    /// EOF packet (0xfe with a payload of at most 5 bytes).
    Eof,
    /// Authentication continuation (0x01 with a short payload).
    AuthMoreData,
    /// Anything else; for a query response this is the column count.
    Other(u8),
}

impl ServerResponse {
    /// Classify a response payload.
    pub fn classify(payload: &[u8]) -> Result<Self, ProtocolError> {
        let Some(&first) = payload.first() else {
            return Err(ProtocolError::UnexpectedEof);
        };

        Ok(match first {
            OK_MARKER => Self::Ok,
            ERR_MARKER => Self::Err,
            EOF_MARKER if payload.len() <= 5 => Self::Eof,
            AUTH_MORE_DATA_MARKER => Self::AuthMoreData,
            other => Self::Other(other),
        })
    }
}
