//! Length-coded binary (LCB) encoding.
//!
//! The protocol's compact variable-length integer encoding: a first byte
//! below 251 is the value itself; 251 marks NULL; 252, 253 and 254 announce
//! a little-endian value in the following 2, 3 or 8 bytes.

use bytes::{Buf, BufMut};

use crate::error::ProtocolError;

/// Marker byte for a NULL value.
pub const NULL_MARKER: u8 = 0xfb;

/// Read a length-coded integer. `Ok(None)` is the NULL marker.
pub fn get_lenenc_int(src: &mut impl Buf) -> Result<Option<u64>, ProtocolError> {
    if !src.has_remaining() {
        return Err(ProtocolError::UnexpectedEof);
    }

    let first = src.get_u8();
    let value = match first {
        0xfb => return Ok(None),
        0xfc => {
            if src.remaining() < 2 {
                return Err(ProtocolError::UnexpectedEof);
            }
            u64::from(src.get_u16_le())
        }
        0xfd => {
            if src.remaining() < 3 {
                return Err(ProtocolError::UnexpectedEof);
            }
            let b0 = u64::from(src.get_u8());
            let b1 = u64::from(src.get_u8());
            let b2 = u64::from(src.get_u8());
            b0 | (b1 << 8) | (b2 << 16)
        }
        0xfe => {
            if src.remaining() < 8 {
                return Err(ProtocolError::UnexpectedEof);
            }
            src.get_u64_le()
        }
        b => u64::from(b),
    };

    Ok(Some(value))
}

/// Read a length-coded byte string. `Ok(None)` is the NULL marker.
pub fn get_lenenc_bytes(src: &mut impl Buf) -> Result<Option<Vec<u8>>, ProtocolError> {
    let Some(len) = get_lenenc_int(src)? else {
        return Ok(None);
    };

    let len = len as usize;
    if src.remaining() < len {
        return Err(ProtocolError::LengthCodedOverrun);
    }

    let mut bytes = vec![0u8; len];
    src.copy_to_slice(&mut bytes);
    Ok(Some(bytes))
}

/// Read a length-coded UTF-8 string. `Ok(None)` is the NULL marker.
pub fn get_lenenc_str(src: &mut impl Buf) -> Result<Option<String>, ProtocolError> {
    match get_lenenc_bytes(src)? {
        None => Ok(None),
        Some(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| ProtocolError::InvalidUtf8("length-coded string")),
    }
}

/// Skip a length-coded byte string, returning whether it was non-NULL.
pub fn skip_lenenc_bytes(src: &mut impl Buf) -> Result<bool, ProtocolError> {
    let Some(len) = get_lenenc_int(src)? else {
        return Ok(false);
    };

    let len = len as usize;
    if src.remaining() < len {
        return Err(ProtocolError::LengthCodedOverrun);
    }
    src.advance(len);
    Ok(true)
}

/// Write a length-coded integer.
pub fn put_lenenc_int(dst: &mut impl BufMut, value: u64) {
    match value {
        0..=250 => dst.put_u8(value as u8),
        251..=0xffff => {
            dst.put_u8(0xfc);
            dst.put_u16_le(value as u16);
        }
        0x1_0000..=0xff_ffff => {
            dst.put_u8(0xfd);
            dst.put_u8((value & 0xff) as u8);
            dst.put_u8(((value >> 8) & 0xff) as u8);
            dst.put_u8(((value >> 16) & 0xff) as u8);
        }
        _ => {
            dst.put_u8(0xfe);
            dst.put_u64_le(value);
        }
    }
}
