//! Mock MySQL server for unit testing.
//!
//! Simulates the server side of the wire protocol: greeting, a scripted
//! authentication outcome, and canned responses to text queries. Enough
//! for exercising a client without a real database instance.
//!
//! ## Example
//!
//! ```rust,ignore
//! use minimysql_testing::{MockMysqlServer, MockResponse};
//!
//! let server = MockMysqlServer::builder()
//!     .with_response("SELECT 1", MockResponse::result_set(
//!         vec![MockColumn::new("db", "t", "one")],
//!         vec![vec![Some("1".into())]],
//!     ))
//!     .build()
//!     .await?;
//!
//! // Connect your client to server.host() / server.port()...
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::{BufMut, BytesMut};
use minimysql_codec::{CodecError, PacketStream};
use mysql_wire::{put_lenenc_int, CapabilityFlags};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};

/// Error type for mock server operations.
#[derive(Debug, Error)]
pub enum MockServerError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Packet exchange error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Result type for mock server operations.
pub type Result<T> = std::result::Result<T, MockServerError>;

/// Scripted outcome of the authentication exchange.
#[derive(Debug, Clone)]
pub enum AuthFlow {
    /// Accept the handshake response immediately with OK.
    Accept,
    /// Send the fast-auth continuation (`0x01 0x03`), then OK.
    FastAuth,
    /// Reject with an ERROR packet.
    Reject {
        /// Server error code.
        code: u16,
        /// Five-character SQLSTATE.
        state: String,
        /// Error message.
        message: String,
    },
}

/// Column identification for a mock result set.
#[derive(Debug, Clone)]
pub struct MockColumn {
    /// Database name.
    pub database: String,
    /// Table name.
    pub table: String,
    /// Column name.
    pub name: String,
}

impl MockColumn {
    /// Create a column descriptor.
    pub fn new(
        database: impl Into<String>,
        table: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
            name: name.into(),
        }
    }
}

/// Canned response for a query.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// OK packet with rows-affected and last-insert-id.
    RowsAffected {
        /// Rows affected.
        rows_affected: u64,
        /// Last insert id.
        last_insert_id: u64,
    },
    /// Column metadata, rows, and optional trailing OK packets after the
    /// final EOF (stored-procedure status shape).
    ResultSet {
        /// Column descriptors.
        columns: Vec<MockColumn>,
        /// Row values; `None` encodes NULL.
        rows: Vec<Vec<Option<String>>>,
        /// Number of trailing OK packets to append.
        trailing_ok: usize,
    },
    /// ERROR packet.
    Error {
        /// Server error code.
        code: u16,
        /// Five-character SQLSTATE.
        state: String,
        /// Error message.
        message: String,
    },
}

impl MockResponse {
    /// An OK response for a non-row-returning statement.
    #[must_use]
    pub fn rows_affected(rows_affected: u64, last_insert_id: u64) -> Self {
        Self::RowsAffected {
            rows_affected,
            last_insert_id,
        }
    }

    /// A result set response.
    #[must_use]
    pub fn result_set(columns: Vec<MockColumn>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self::ResultSet {
            columns,
            rows,
            trailing_ok: 0,
        }
    }

    /// Append trailing OK packets after the result set's final EOF.
    #[must_use]
    pub fn with_trailing_ok(mut self, count: usize) -> Self {
        if let Self::ResultSet { trailing_ok, .. } = &mut self {
            *trailing_ok = count;
        }
        self
    }

    /// An ERROR response.
    #[must_use]
    pub fn error(code: u16, state: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            state: state.into(),
            message: message.into(),
        }
    }
}

/// Configuration for the mock server.
pub struct MockServerConfig {
    server_version: String,
    auth_plugin: String,
    seed: [u8; 20],
    auth_flow: AuthFlow,
    responses: HashMap<String, MockResponse>,
    default_response: Option<MockResponse>,
}

/// Builder for [`MockMysqlServer`].
pub struct MockServerBuilder {
    config: MockServerConfig,
}

impl MockServerBuilder {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: MockServerConfig {
                server_version: "8.0.39-mock".to_string(),
                auth_plugin: "mysql_native_password".to_string(),
                seed: *b"0123456789abcdefghij",
                auth_flow: AuthFlow::Accept,
                responses: HashMap::new(),
                default_response: None,
            },
        }
    }

    /// Set the version string sent in the greeting.
    #[must_use]
    pub fn with_server_version(mut self, version: impl Into<String>) -> Self {
        self.config.server_version = version.into();
        self
    }

    /// Set the auth plugin name announced in the greeting.
    #[must_use]
    pub fn with_auth_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.config.auth_plugin = plugin.into();
        self
    }

    /// Set the 20-byte challenge seed.
    #[must_use]
    pub fn with_seed(mut self, seed: [u8; 20]) -> Self {
        self.config.seed = seed;
        self
    }

    /// Script the authentication outcome.
    #[must_use]
    pub fn with_auth_flow(mut self, flow: AuthFlow) -> Self {
        self.config.auth_flow = flow;
        self
    }

    /// Add a response for a specific SQL statement (exact match).
    #[must_use]
    pub fn with_response(mut self, sql: impl Into<String>, response: MockResponse) -> Self {
        self.config.responses.insert(sql.into(), response);
        self
    }

    /// Set the response for unmatched statements.
    #[must_use]
    pub fn with_default_response(mut self, response: MockResponse) -> Self {
        self.config.default_response = Some(response);
        self
    }

    /// Build and start the mock server.
    pub async fn build(self) -> Result<MockMysqlServer> {
        MockMysqlServer::start(self.config).await
    }
}

impl Default for MockServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A mock MySQL server for testing.
pub struct MockMysqlServer {
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    connection_count: Arc<Mutex<usize>>,
}

impl MockMysqlServer {
    /// Create a new builder for the mock server.
    #[must_use]
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::new()
    }

    /// Start the mock server on an available port.
    pub async fn start(config: MockServerConfig) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, _) = broadcast::channel(1);
        let config = Arc::new(config);
        let connection_count = Arc::new(Mutex::new(0usize));

        let server = Self {
            addr,
            shutdown_tx: shutdown_tx.clone(),
            connection_count: connection_count.clone(),
        };

        let mut shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _peer_addr)) => {
                                let config = config.clone();
                                let count = connection_count.clone();
                                tokio::spawn(async move {
                                    {
                                        let mut c = count.lock().await;
                                        *c += 1;
                                    }
                                    if let Err(e) = handle_connection(stream, config).await {
                                        tracing::debug!("connection error: {e}");
                                    }
                                    {
                                        let mut c = count.lock().await;
                                        *c = c.saturating_sub(1);
                                    }
                                });
                            }
                            Err(e) => {
                                tracing::error!("accept error: {e}");
                                break;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Ok(server)
    }

    /// The server's listening address.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The host string for client configuration.
    #[must_use]
    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    /// The port number.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// The current connection count.
    pub async fn connection_count(&self) -> usize {
        *self.connection_count.lock().await
    }

    /// Stop the server.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

impl Drop for MockMysqlServer {
    fn drop(&mut self) {
        self.stop();
    }
}

const READ_TIMEOUT: Duration = Duration::from_secs(5);

async fn handle_connection(
    stream: TcpStream,
    config: Arc<MockServerConfig>,
) -> Result<()> {
    let mut stream = PacketStream::new(stream, READ_TIMEOUT);

    stream.write_packet(&greeting_payload(&config)).await?;

    // Handshake response; contents are not validated, the scripted flow
    // decides the outcome.
    stream.read_packet().await?;

    match &config.auth_flow {
        AuthFlow::Accept => {
            stream.write_packet(&ok_payload(0, 0)).await?;
        }
        AuthFlow::FastAuth => {
            stream.write_packet(&[0x01, 0x03]).await?;
            stream.write_packet(&ok_payload(0, 0)).await?;
        }
        AuthFlow::Reject {
            code,
            state,
            message,
        } => {
            stream
                .write_packet(&err_payload(*code, state, message))
                .await?;
            return Ok(());
        }
    }

    loop {
        let payload = match stream.read_packet().await {
            Ok(payload) => payload.to_vec(),
            Err(CodecError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        match payload.split_first() {
            Some((0x01, _)) => return Ok(()),
            Some((0x03, sql)) => {
                let sql = String::from_utf8_lossy(sql).into_owned();
                let response = config
                    .responses
                    .get(&sql)
                    .or(config.default_response.as_ref())
                    .cloned()
                    .unwrap_or_else(|| {
                        MockResponse::error(1064, "42000", format!("no mock for: {sql}"))
                    });
                write_response(&mut stream, &response).await?;
            }
            _ => {
                stream
                    .write_packet(&err_payload(1047, "08S01", "Unknown command"))
                    .await?;
            }
        }
    }
}

async fn write_response(
    stream: &mut PacketStream<TcpStream>,
    response: &MockResponse,
) -> Result<()> {
    match response {
        MockResponse::RowsAffected {
            rows_affected,
            last_insert_id,
        } => {
            stream
                .write_packet(&ok_payload(*rows_affected, *last_insert_id))
                .await?;
        }
        MockResponse::Error {
            code,
            state,
            message,
        } => {
            stream.write_packet(&err_payload(*code, state, message)).await?;
        }
        MockResponse::ResultSet {
            columns,
            rows,
            trailing_ok,
        } => {
            let mut buf = BytesMut::new();
            put_lenenc_int(&mut buf, columns.len() as u64);
            stream.write_packet(&buf).await?;

            for column in columns {
                stream.write_packet(&column_payload(column)).await?;
            }
            stream.write_packet(&eof_payload()).await?;

            for row in rows {
                stream.write_packet(&row_payload(row)).await?;
            }
            stream.write_packet(&eof_payload()).await?;

            for _ in 0..*trailing_ok {
                stream.write_packet(&ok_payload(0, 0)).await?;
            }
        }
    }
    Ok(())
}

fn greeting_payload(config: &MockServerConfig) -> Vec<u8> {
    let caps = CapabilityFlags::client_base();

    let mut buf = BytesMut::new();
    buf.put_u8(0x0a);
    buf.put_slice(config.server_version.as_bytes());
    buf.put_u8(0);
    // Thread id.
    buf.put_u32_le(42);
    buf.put_slice(&config.seed[..8]);
    // Filler.
    buf.put_u8(0);
    buf.put_u16_le((caps.bits() & 0xffff) as u16);
    // Charset and status flags.
    buf.put_u8(8);
    buf.put_u16_le(0x0002);
    buf.put_u16_le((caps.bits() >> 16) as u16);
    // Auth data length: 20 seed bytes plus the NUL.
    buf.put_u8(21);
    buf.put_bytes(0, 10);
    buf.put_slice(&config.seed[8..]);
    buf.put_u8(0);
    buf.put_slice(config.auth_plugin.as_bytes());
    buf.put_u8(0);
    buf.to_vec()
}

fn ok_payload(rows_affected: u64, last_insert_id: u64) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_u8(0x00);
    put_lenenc_int(&mut buf, rows_affected);
    put_lenenc_int(&mut buf, last_insert_id);
    // Status flags (autocommit) and warning count.
    buf.put_u16_le(0x0002);
    buf.put_u16_le(0);
    buf.to_vec()
}

fn err_payload(code: u16, state: &str, message: &str) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_u8(0xff);
    buf.put_u16_le(code);
    buf.put_u8(b'#');
    buf.put_slice(state.as_bytes());
    buf.put_slice(message.as_bytes());
    buf.to_vec()
}

fn eof_payload() -> Vec<u8> {
    vec![0xfe, 0x00, 0x00, 0x02, 0x00]
}

fn put_lenenc_str(buf: &mut BytesMut, s: &str) {
    put_lenenc_int(buf, s.len() as u64);
    buf.put_slice(s.as_bytes());
}

fn column_payload(column: &MockColumn) -> Vec<u8> {
    let mut buf = BytesMut::new();
    put_lenenc_str(&mut buf, "def");
    put_lenenc_str(&mut buf, &column.database);
    put_lenenc_str(&mut buf, &column.table);
    put_lenenc_str(&mut buf, &column.table);
    put_lenenc_str(&mut buf, &column.name);
    put_lenenc_str(&mut buf, &column.name);
    // Fixed metadata: length marker, charset, display length, type
    // (VAR_STRING), flags, decimals, filler.
    buf.put_u8(0x0c);
    buf.put_u16_le(8);
    buf.put_u32_le(255);
    buf.put_u8(0xfd);
    buf.put_u16_le(0);
    buf.put_u8(0);
    buf.put_u16_le(0);
    buf.to_vec()
}

fn row_payload(row: &[Option<String>]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    for value in row {
        match value {
            Some(v) => put_lenenc_str(&mut buf, v),
            None => buf.put_u8(0xfb),
        }
    }
    buf.to_vec()
}
