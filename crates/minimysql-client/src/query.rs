//! Statement execution and result-set streaming.

use std::time::Duration;

use bytes::BytesMut;
use mysql_wire::{
    decode_row, get_lenenc_int, ColumnDefinition, Command, ErrPacket, ProtocolError,
    ServerResponse, MAX_COLUMNS,
};

use crate::client::Client;
use crate::error::{Error, Result};

/// Deadline for the probe that drains trailing status packets after a
/// result set; a timeout here means "nothing more pending", not failure.
const DRAIN_PROBE_TIMEOUT: Duration = Duration::from_millis(100);

/// Summary of a statement that returned no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySummary {
    /// Rows affected by the statement.
    pub rows_affected: u64,
    /// Last insert id generated by the statement.
    pub last_insert_id: u64,
    /// Warning count reported by the server.
    pub warnings: u16,
}

/// Column descriptor from a result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Database the column belongs to.
    pub database: String,
    /// Table the column belongs to.
    pub table: String,
    /// Column name.
    pub name: String,
}

/// Outcome of [`Client::execute`].
#[derive(Debug)]
pub enum QueryResult<'a> {
    /// Non-row-returning statement: rows-affected and last-insert-id.
    Summary(QuerySummary),
    /// Row-returning statement: a streamable result set borrowing the
    /// client until consumed.
    ResultSet(ResultSet<'a>),
}

impl<'a> QueryResult<'a> {
    /// The summary, if the statement returned no rows.
    #[must_use]
    pub fn summary(&self) -> Option<&QuerySummary> {
        match self {
            Self::Summary(summary) => Some(summary),
            Self::ResultSet(_) => None,
        }
    }

    /// The result set, if the statement returned rows.
    pub fn result_set(self) -> Option<ResultSet<'a>> {
        match self {
            Self::Summary(_) => None,
            Self::ResultSet(set) => Some(set),
        }
    }
}

/// One decoded row, borrowing the result set's reusable buffer.
#[derive(Debug)]
pub struct Row<'a> {
    columns: &'a [Column],
    values: &'a [Option<String>],
}

impl Row<'_> {
    /// Value at `index`; `None` for NULL or out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    /// Value for the named column; `None` for NULL or unknown name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&str> {
        let index = self.columns.iter().position(|c| c.name == name)?;
        self.get(index)
    }

    /// Whether the value at `index` is NULL.
    #[must_use]
    pub fn is_null(&self, index: usize) -> bool {
        matches!(self.values.get(index), Some(None))
    }

    /// All values in column order.
    #[must_use]
    pub fn values(&self) -> &[Option<String>] {
        self.values
    }

    /// Number of values (the column count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A streaming result set.
///
/// Column metadata must be read before rows; one row is buffered at a
/// time, replaced by each [`next_row`](Self::next_row) call.
#[derive(Debug)]
pub struct ResultSet<'a> {
    client: &'a mut Client,
    column_count: usize,
    columns: Vec<Column>,
    row: Vec<Option<String>>,
    columns_read: bool,
    finished: bool,
}

impl ResultSet<'_> {
    /// Number of columns announced by the server.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Read the column descriptors and the terminating EOF.
    ///
    /// Idempotent: subsequent calls return the already-read metadata.
    pub async fn columns(&mut self) -> Result<&[Column]> {
        if self.columns_read {
            return Ok(&self.columns);
        }

        for _ in 0..self.column_count {
            let payload = self.client.stream.read_packet().await?;
            let def = ColumnDefinition::decode(&mut &payload[..])?;
            self.columns.push(Column {
                database: def.database,
                table: def.table,
                name: def.name,
            });
        }

        let marker = {
            let payload = self.client.stream.read_packet().await?;
            match ServerResponse::classify(payload)? {
                ServerResponse::Eof => None,
                ServerResponse::Err => Some(ErrPacket::decode(&mut &payload[..])?),
                other => {
                    let byte = match other {
                        ServerResponse::Other(b) => b,
                        _ => payload[0],
                    };
                    return Err(Error::Protocol(ProtocolError::UnexpectedPacketType(byte)));
                }
            }
        };
        if let Some(err) = marker {
            return Err(Error::Server {
                code: err.code,
                state: err.sql_state,
                message: err.message,
            });
        }

        self.columns_read = true;
        Ok(&self.columns)
    }

    /// Read the next row, or `None` at the end of the set.
    ///
    /// The returned row borrows an internal buffer that the next call
    /// overwrites — no look-ahead, no row history. Must be preceded by
    /// [`columns`](Self::columns).
    pub async fn next_row(&mut self) -> Result<Option<Row<'_>>> {
        if !self.columns_read {
            return Err(Error::InvalidSequence(
                "rows requested before column metadata was read",
            ));
        }
        if self.finished {
            return Ok(None);
        }

        let end_of_rows = {
            let payload = self.client.stream.read_packet().await?;
            match ServerResponse::classify(payload)? {
                ServerResponse::Eof => true,
                ServerResponse::Err => {
                    let err = ErrPacket::decode(&mut &payload[..])?;
                    return Err(Error::Server {
                        code: err.code,
                        state: err.sql_state,
                        message: err.message,
                    });
                }
                _ => {
                    decode_row(&mut &payload[..], self.column_count, &mut self.row)?;
                    false
                }
            }
        };

        if end_of_rows {
            self.finished = true;
            self.row.clear();
            self.drain_trailing().await?;
            return Ok(None);
        }

        Ok(Some(Row {
            columns: &self.columns,
            values: &self.row,
        }))
    }

    /// Discard trailing OK-shaped packets after the end of the rows
    /// (stored-procedure status packets). Stops cleanly when no packet
    /// arrives within the probe deadline; a pending non-OK packet is an
    /// error.
    async fn drain_trailing(&mut self) -> Result<()> {
        loop {
            let shape = match self
                .client
                .stream
                .read_packet_with_timeout(DRAIN_PROBE_TIMEOUT)
                .await
            {
                Ok(payload) => ServerResponse::classify(payload)?,
                Err(e) if e.is_timeout() => return Ok(()),
                Err(e) => return Err(e.into()),
            };

            match shape {
                ServerResponse::Ok | ServerResponse::Eof => {
                    tracing::trace!("drained trailing status packet");
                }
                ServerResponse::Err => {
                    return Err(Error::Protocol(ProtocolError::UnexpectedPacketType(
                        mysql_wire::ERR_MARKER,
                    )));
                }
                ServerResponse::AuthMoreData => {
                    return Err(Error::Protocol(ProtocolError::UnexpectedPacketType(
                        mysql_wire::AUTH_MORE_DATA_MARKER,
                    )));
                }
                ServerResponse::Other(byte) => {
                    return Err(Error::Protocol(ProtocolError::UnexpectedPacketType(byte)));
                }
            }
        }
    }
}

impl Client {
    /// Execute one text-protocol statement.
    ///
    /// Frames the statement as a single COM_QUERY packet (sequence id
    /// reset to 0) and reads the first response. A statement longer than
    /// the maximum packet payload is rejected before any byte is written.
    pub async fn execute(&mut self, statement: &str) -> Result<QueryResult<'_>> {
        self.stream.reset_sequence(0);

        let mut body = BytesMut::with_capacity(statement.len() + 1);
        Command::Query.encode(statement.as_bytes(), &mut body);
        self.stream.write_packet(&body).await?;

        tracing::debug!(statement_len = statement.len(), "sent query");

        enum First {
            Summary(QuerySummary),
            Error(ErrPacket),
            Columns(usize),
        }

        let first = {
            let payload = self.stream.read_packet().await?;
            match ServerResponse::classify(payload)? {
                ServerResponse::Ok | ServerResponse::Eof => {
                    let ok = mysql_wire::OkPacket::decode(&mut &payload[..])?;
                    First::Summary(QuerySummary {
                        rows_affected: ok.affected_rows,
                        last_insert_id: ok.last_insert_id,
                        warnings: ok.warnings,
                    })
                }
                ServerResponse::Err => First::Error(ErrPacket::decode(&mut &payload[..])?),
                _ => {
                    let mut src = &payload[..];
                    let count = get_lenenc_int(&mut src)?
                        .ok_or(ProtocolError::UnexpectedPacketType(0xfb))?;
                    let count = usize::try_from(count)
                        .map_err(|_| ProtocolError::TooManyColumns {
                            count: usize::MAX,
                            max: MAX_COLUMNS,
                        })?;
                    if count == 0 || count > MAX_COLUMNS {
                        return Err(Error::Protocol(ProtocolError::TooManyColumns {
                            count,
                            max: MAX_COLUMNS,
                        }));
                    }
                    First::Columns(count)
                }
            }
        };

        match first {
            First::Summary(summary) => {
                tracing::debug!(
                    rows_affected = summary.rows_affected,
                    last_insert_id = summary.last_insert_id,
                    "statement complete"
                );
                Ok(QueryResult::Summary(summary))
            }
            First::Error(err) => Err(Error::Server {
                code: err.code,
                state: err.sql_state,
                message: err.message,
            }),
            First::Columns(count) => Ok(QueryResult::ResultSet(ResultSet {
                client: self,
                column_count: count,
                columns: Vec::with_capacity(count),
                row: Vec::with_capacity(count),
                columns_read: false,
                finished: false,
            })),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_row_accessors() {
        let columns = vec![
            Column {
                database: "shop".into(),
                table: "orders".into(),
                name: "id".into(),
            },
            Column {
                database: "shop".into(),
                table: "orders".into(),
                name: "note".into(),
            },
        ];
        let values = vec![Some("7".to_string()), None];
        let row = Row {
            columns: &columns,
            values: &values,
        };

        assert_eq!(row.len(), 2);
        assert_eq!(row.get(0), Some("7"));
        assert_eq!(row.get(1), None);
        assert!(row.is_null(1));
        assert!(!row.is_null(0));
        assert_eq!(row.get_by_name("id"), Some("7"));
        assert_eq!(row.get_by_name("missing"), None);
    }
}
