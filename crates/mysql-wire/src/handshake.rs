//! Handshake packet codecs.

use bytes::{Buf, BufMut};

use crate::capability::CapabilityFlags;
use crate::error::ProtocolError;

/// Length of the concatenated challenge seed.
pub const SEED_LEN: usize = 20;

/// Default charset sent in the handshake response (8 = latin1).
pub const DEFAULT_CHARSET: u8 = 8;

/// Max-packet-size value advertised in the handshake response (16 MiB).
pub const RESPONSE_MAX_PACKET_SIZE: u32 = 0x0100_0000;

/// Default scheme name assumed when the server omits one.
pub const DEFAULT_AUTH_PLUGIN: &str = "mysql_native_password";

/// Initial handshake packet (server to client).
///
/// Carries the server version, the combined capability mask, the 20-byte
/// challenge seed split across two fragments, and the name of the
/// authentication plugin the server wants the client to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    /// Server version string.
    pub server_version: String,
    /// Combined 32-bit capability mask.
    pub capabilities: CapabilityFlags,
    /// Concatenated challenge seed.
    pub seed: [u8; SEED_LEN],
    /// Authentication plugin name requested by the server.
    pub auth_plugin: String,
}

impl Handshake {
    /// Decode a handshake payload.
    ///
    /// Layout: protocol version (discarded), NUL-terminated server version,
    /// thread id (discarded), 8-byte seed fragment, filler, low capability
    /// word, charset and status (discarded), high capability word, auth-data
    /// length, 10 reserved bytes, second seed fragment, plugin name.
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        if !src.has_remaining() {
            return Err(ProtocolError::UnexpectedEof);
        }

        // Protocol version.
        src.advance(1);

        let server_version = read_nul_terminated(src)?;

        if src.remaining() < 4 + 8 + 1 + 2 {
            return Err(ProtocolError::UnexpectedEof);
        }

        // Thread id.
        src.advance(4);

        let mut seed = [0u8; SEED_LEN];
        src.copy_to_slice(&mut seed[..8]);

        // Filler.
        src.advance(1);

        let caps_low = src.get_u16_le();

        if src.remaining() < 1 + 2 + 2 {
            return Err(ProtocolError::UnexpectedEof);
        }

        // Charset and status flags.
        src.advance(3);

        let caps_high = src.get_u16_le();
        let capabilities = CapabilityFlags::from_halves(caps_low, caps_high);

        let auth_data_len = if src.has_remaining() { src.get_u8() as usize } else { 0 };

        // Reserved bytes.
        let reserved = src.remaining().min(10);
        src.advance(reserved);

        // Second seed fragment: declared as auth_data_len - 8 but at least
        // 12 bytes, clamped to what the packet actually carries. Only the
        // first 12 bytes complete the 20-byte seed.
        let second_len = auth_data_len.saturating_sub(8).max(12);
        let available = second_len.min(src.remaining());

        let mut fragment = vec![0u8; available];
        src.copy_to_slice(&mut fragment);
        let used = available.min(12);
        seed[8..8 + used].copy_from_slice(&fragment[..used]);

        let auth_plugin = match read_nul_terminated(src) {
            Ok(name) if !name.is_empty() => name,
            _ => DEFAULT_AUTH_PLUGIN.to_string(),
        };

        Ok(Self {
            server_version,
            capabilities,
            seed,
            auth_plugin,
        })
    }
}

/// Handshake response packet (client to server).
#[derive(Debug, Clone)]
pub struct HandshakeResponse<'a> {
    /// Client capability flags.
    pub capabilities: CapabilityFlags,
    /// Charset byte.
    pub charset: u8,
    /// User name.
    pub user: &'a str,
    /// Scramble bytes; empty for an empty password.
    pub scramble: &'a [u8],
    /// Optional default database.
    pub database: Option<&'a str>,
    /// Plugin name matching the one accepted at handshake time.
    pub auth_plugin: &'a str,
}

impl HandshakeResponse<'_> {
    /// Encode the response payload.
    ///
    /// Layout: capabilities, max-packet-size, charset, 23 filler bytes,
    /// NUL-terminated user, length-prefixed scramble, NUL-terminated
    /// database (optional), NUL-terminated plugin name.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u32_le(self.capabilities.bits());
        dst.put_u32_le(RESPONSE_MAX_PACKET_SIZE);
        dst.put_u8(self.charset);
        dst.put_bytes(0, 23);

        dst.put_slice(self.user.as_bytes());
        dst.put_u8(0);

        dst.put_u8(self.scramble.len() as u8);
        dst.put_slice(self.scramble);

        if let Some(db) = self.database {
            dst.put_slice(db.as_bytes());
        }
        dst.put_u8(0);

        dst.put_slice(self.auth_plugin.as_bytes());
        dst.put_u8(0);
    }
}

/// Upgrade-request packet sent before the TLS handshake.
///
/// Identical to the first 32 bytes of the handshake response: capability
/// flags with the SSL bit set, max-packet-size, charset, 23 filler bytes,
/// and no further payload.
#[derive(Debug, Clone, Copy)]
pub struct SslRequest {
    /// Client capability flags (the SSL bit is set during encoding).
    pub capabilities: CapabilityFlags,
    /// Charset byte.
    pub charset: u8,
}

impl SslRequest {
    /// Fixed payload size of the upgrade-request packet.
    pub const PAYLOAD_LEN: usize = 32;

    /// Encode the 32-byte payload.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u32_le((self.capabilities | CapabilityFlags::SSL).bits());
        dst.put_u32_le(RESPONSE_MAX_PACKET_SIZE);
        dst.put_u8(self.charset);
        dst.put_bytes(0, 23);
    }
}

/// Read a NUL-terminated UTF-8 string, consuming the terminator.
///
/// Bytes past the terminator are opaque to this client; no charset
/// conversion is applied.
fn read_nul_terminated(src: &mut impl Buf) -> Result<String, ProtocolError> {
    let mut bytes = Vec::new();
    while src.has_remaining() {
        let b = src.get_u8();
        if b == 0 {
            return String::from_utf8(bytes)
                .map_err(|_| ProtocolError::InvalidUtf8("nul-terminated string"));
        }
        bytes.push(b);
    }
    Err(ProtocolError::UnexpectedEof)
}
