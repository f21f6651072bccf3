//! Result-set metadata and row decoding.

use bytes::Buf;

use crate::error::ProtocolError;
use crate::lcb::{get_lenenc_str, skip_lenenc_bytes};

/// Maximum number of columns a result set may declare.
///
/// Kept small to bound per-connection memory on constrained devices.
pub const MAX_COLUMNS: usize = 32;

/// Column descriptor from a field-definition packet.
///
/// Only the database, table and column names are retained; the remaining
/// metadata (charset, display length, type, flags) is read and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// Schema the column belongs to.
    pub database: String,
    /// Table the column belongs to.
    pub table: String,
    /// Column name (alias if one was used).
    pub name: String,
}

impl ColumnDefinition {
    /// Decode a protocol-4.1 field-definition payload.
    ///
    /// Layout: catalog, db, table, org-table, name, org-name as
    /// length-coded strings, then fixed metadata this client ignores.
    pub fn decode(src: &mut impl Buf) -> Result<Self, ProtocolError> {
        // Catalog, always "def".
        skip_lenenc_bytes(src)?;

        let database = get_lenenc_str(src)?.unwrap_or_default();
        let table = get_lenenc_str(src)?.unwrap_or_default();

        // org_table.
        skip_lenenc_bytes(src)?;

        let name = get_lenenc_str(src)?.unwrap_or_default();

        // org_name and fixed-length metadata are read but discarded.
        skip_lenenc_bytes(src)?;

        Ok(Self {
            database,
            table,
            name,
        })
    }
}

/// Decode a text-protocol row payload into `values`.
///
/// Each column arrives as a length-coded string; the 0xfb marker decodes
/// to `None`. The destination vector is cleared first so one allocation
/// can be reused across rows.
pub fn decode_row(
    src: &mut impl Buf,
    column_count: usize,
    values: &mut Vec<Option<String>>,
) -> Result<(), ProtocolError> {
    values.clear();
    for _ in 0..column_count {
        values.push(get_lenenc_str(src)?);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bytes::{BufMut, BytesMut};

    use super::*;

    fn put_lenenc_str(dst: &mut BytesMut, s: &str) {
        crate::lcb::put_lenenc_int(dst, s.len() as u64);
        dst.put_slice(s.as_bytes());
    }

    #[test]
    fn test_column_decode() {
        let mut buf = BytesMut::new();
        put_lenenc_str(&mut buf, "def");
        put_lenenc_str(&mut buf, "shop");
        put_lenenc_str(&mut buf, "orders");
        put_lenenc_str(&mut buf, "orders");
        put_lenenc_str(&mut buf, "total");
        put_lenenc_str(&mut buf, "total");
        // Fixed metadata: filler, charset, length, type, flags, decimals, filler.
        buf.put_u8(0x0c);
        buf.put_u16_le(8);
        buf.put_u32_le(11);
        buf.put_u8(0x03);
        buf.put_u16_le(0);
        buf.put_u8(0);
        buf.put_u16_le(0);

        let mut src = buf.as_ref();
        let col = ColumnDefinition::decode(&mut src).unwrap();
        assert_eq!(col.database, "shop");
        assert_eq!(col.table, "orders");
        assert_eq!(col.name, "total");
    }

    #[test]
    fn test_column_decode_truncated() {
        let mut src = &[0x03u8, b'd', b'e'][..];
        assert!(ColumnDefinition::decode(&mut src).is_err());
    }

    #[test]
    fn test_row_decode_with_null() {
        let mut buf = BytesMut::new();
        put_lenenc_str(&mut buf, "42");
        buf.put_u8(0xfb);
        put_lenenc_str(&mut buf, "");

        let mut values = Vec::new();
        let mut src = buf.as_ref();
        decode_row(&mut src, 3, &mut values).unwrap();
        assert_eq!(values[0].as_deref(), Some("42"));
        assert_eq!(values[1], None);
        assert_eq!(values[2].as_deref(), Some(""));
    }

    #[test]
    fn test_row_decode_reuses_buffer() {
        let mut values = vec![Some("stale".to_string()); 2];
        let mut buf = BytesMut::new();
        put_lenenc_str(&mut buf, "fresh");

        let mut src = buf.as_ref();
        decode_row(&mut src, 1, &mut values).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].as_deref(), Some("fresh"));
    }
}
