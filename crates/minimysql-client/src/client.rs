//! Client connection and the authentication state machine.

use std::time::Duration;

use bytes::BytesMut;
use minimysql_auth::{
    caching_sha2_scramble, continuation, encrypt_password_with_server_key,
    native_password_scramble, AuthError, AuthScheme, Credentials,
};
use minimysql_codec::{CodecError, PacketStream};
use minimysql_tls::{TlsConnector, TlsError, TlsStream};
use mysql_wire::{
    CapabilityFlags, Command, ErrPacket, Handshake, HandshakeResponse, ServerResponse, SslRequest,
    AUTH_MORE_DATA_MARKER, ERR_MARKER,
};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use zeroize::Zeroizing;

use crate::config::{Config, TlsMode};
use crate::error::{Error, Result};

/// The packet stream behind a client, plaintext or upgraded.
///
/// The TLS variant is boxed: the rustls session state dwarfs the plain
/// variant and would otherwise be carried by every client.
pub(crate) enum StreamHandle {
    /// Cleartext TCP.
    Plain(PacketStream<TcpStream>),
    /// TLS over TCP.
    Tls(Box<PacketStream<TlsStream<TcpStream>>>),
}

impl StreamHandle {
    pub(crate) async fn read_packet(&mut self) -> std::result::Result<&[u8], CodecError> {
        match self {
            Self::Plain(s) => s.read_packet().await,
            Self::Tls(s) => s.read_packet().await,
        }
    }

    pub(crate) async fn read_packet_with_timeout(
        &mut self,
        deadline: Duration,
    ) -> std::result::Result<&[u8], CodecError> {
        match self {
            Self::Plain(s) => s.read_packet_with_timeout(deadline).await,
            Self::Tls(s) => s.read_packet_with_timeout(deadline).await,
        }
    }

    pub(crate) async fn write_packet(&mut self, payload: &[u8]) -> std::result::Result<(), CodecError> {
        match self {
            Self::Plain(s) => s.write_packet(payload).await,
            Self::Tls(s) => s.write_packet(payload).await,
        }
    }

    pub(crate) fn reset_sequence(&mut self, id: u8) {
        match self {
            Self::Plain(s) => s.reset_sequence(id),
            Self::Tls(s) => s.reset_sequence(id),
        }
    }

    pub(crate) fn buffer_high_water(&self) -> usize {
        match self {
            Self::Plain(s) => s.buffer_high_water(),
            Self::Tls(s) => s.buffer_high_water(),
        }
    }

    async fn shutdown(&mut self) -> std::io::Result<()> {
        match self {
            Self::Plain(s) => s.stream_mut().shutdown().await,
            Self::Tls(s) => s.stream_mut().shutdown().await,
        }
    }
}

/// An authenticated MySQL connection.
///
/// One client serves one logical flow at a time; all query methods take
/// `&mut self`, and a result set borrows the client until it is consumed.
pub struct Client {
    pub(crate) stream: StreamHandle,
    capabilities: CapabilityFlags,
    server_version: String,
}

impl Client {
    /// Connect and authenticate per the configuration.
    ///
    /// Drives the full handshake: TCP connect with bounded retries, server
    /// greeting, optional TLS upgrade, scramble exchange, and the full-auth
    /// continuation when the server demands it. Any packet-exchange error
    /// after the TCP session exists is terminal for the attempt.
    pub async fn connect(config: Config) -> Result<Self> {
        config.validate()?;

        let tcp = Self::connect_tcp(&config).await?;
        let mut stream = PacketStream::new(tcp, config.timeouts.plain_read_timeout);

        let handshake = {
            let payload = stream.read_packet().await?;
            if payload.first() == Some(&ERR_MARKER) {
                let err = ErrPacket::decode(&mut &payload[..])?;
                return Err(Error::Authentication(AuthError::ServerRejected {
                    code: err.code,
                    state: err.sql_state,
                    message: err.message,
                }));
            }
            Handshake::decode(&mut &payload[..])?
        };

        tracing::debug!(
            server_version = %handshake.server_version,
            auth_plugin = %handshake.auth_plugin,
            "received server greeting"
        );

        let scheme = AuthScheme::from_plugin_name(&handshake.auth_plugin)
            .map_err(Error::Authentication)?;

        let mut capabilities = CapabilityFlags::client_base();

        let upgrade = match &config.tls {
            TlsMode::Disabled => None,
            TlsMode::Preferred(tls_config) => {
                if handshake.capabilities.supports_ssl() {
                    Some(tls_config.clone())
                } else {
                    tracing::warn!("server does not advertise TLS, proceeding in cleartext");
                    None
                }
            }
            TlsMode::Required(tls_config) => {
                if handshake.capabilities.supports_ssl() {
                    Some(tls_config.clone())
                } else {
                    return Err(Error::Tls(TlsError::NotSupportedByServer));
                }
            }
        };

        let mut handle = if let Some(tls_config) = upgrade {
            let mut body = BytesMut::with_capacity(SslRequest::PAYLOAD_LEN);
            SslRequest {
                capabilities,
                charset: config.charset,
            }
            .encode(&mut body);
            stream.write_packet(&body).await?;
            capabilities |= CapabilityFlags::SSL;

            let (tcp, parts) = stream.into_parts();
            let connector = TlsConnector::new(tls_config)?;
            let tls_stream = timeout(
                config.timeouts.tls_handshake_timeout,
                connector.connect(tcp, &config.host),
            )
            .await
            .map_err(|_| Error::Tls(TlsError::HandshakeFailed("handshake timed out".into())))??;

            StreamHandle::Tls(Box::new(PacketStream::from_parts(
                tls_stream,
                parts,
                config.timeouts.secure_read_timeout,
            )))
        } else {
            StreamHandle::Plain(stream)
        };

        let secure_channel = matches!(handle, StreamHandle::Tls(_));
        match &mut handle {
            StreamHandle::Plain(s) => {
                run_auth(
                    s,
                    &handshake,
                    scheme,
                    &config.credentials,
                    capabilities,
                    config.charset,
                    secure_channel,
                )
                .await?;
            }
            StreamHandle::Tls(s) => {
                run_auth(
                    s.as_mut(),
                    &handshake,
                    scheme,
                    &config.credentials,
                    capabilities,
                    config.charset,
                    secure_channel,
                )
                .await?;
            }
        }

        tracing::info!(
            host = %config.host,
            port = config.port,
            server_version = %handshake.server_version,
            scheme = %scheme,
            tls = secure_channel,
            "connected"
        );

        Ok(Self {
            stream: handle,
            capabilities,
            server_version: handshake.server_version,
        })
    }

    /// TCP connect with a bounded attempt count and fixed retry delay.
    async fn connect_tcp(config: &Config) -> Result<TcpStream> {
        for attempt in 1..=config.connect_attempts {
            match timeout(
                config.timeouts.connect_timeout,
                TcpStream::connect((config.host.as_str(), config.port)),
            )
            .await
            {
                Ok(Ok(stream)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        tracing::debug!(error = %e, "failed to set TCP_NODELAY");
                    }
                    return Ok(stream);
                }
                Ok(Err(e)) => {
                    tracing::warn!(attempt, error = %e, "TCP connect failed");
                }
                Err(_) => {
                    tracing::warn!(attempt, "TCP connect timed out");
                }
            }

            if attempt < config.connect_attempts {
                tokio::time::sleep(config.connect_retry_delay).await;
            }
        }

        Err(Error::ConnectRetriesExhausted {
            attempts: config.connect_attempts,
        })
    }

    /// The server version string from the greeting.
    #[must_use]
    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    /// The capability flags sent in the handshake response.
    #[must_use]
    pub fn capabilities(&self) -> CapabilityFlags {
        self.capabilities
    }

    /// High-water size of the receive buffer.
    #[must_use]
    pub fn buffer_high_water(&self) -> usize {
        self.stream.buffer_high_water()
    }

    /// Close the connection, announcing the quit to the server.
    pub async fn close(mut self) -> Result<()> {
        self.stream.reset_sequence(0);
        let mut body = BytesMut::with_capacity(1);
        Command::Quit.encode(&[], &mut body);

        // The server may drop the connection before acknowledging the
        // write; only a shutdown failure is worth reporting.
        if let Err(e) = self.stream.write_packet(&body).await {
            tracing::debug!(error = %e, "quit packet not delivered");
        }
        self.stream.shutdown().await?;
        Ok(())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("server_version", &self.server_version)
            .field("capabilities", &self.capabilities)
            .field("tls", &matches!(self.stream, StreamHandle::Tls(_)))
            .finish_non_exhaustive()
    }
}

/// One step of the post-response authentication exchange, copied out of
/// the receive buffer so the stream can be written to again.
enum AuthStep {
    Accepted,
    Rejected(AuthError),
    Continuation(u8),
    Unexpected(u8),
}

fn classify_auth_packet(payload: &[u8]) -> Result<AuthStep> {
    Ok(match ServerResponse::classify(payload)? {
        ServerResponse::Ok => AuthStep::Accepted,
        ServerResponse::Err => {
            let err = ErrPacket::decode(&mut &payload[..])?;
            AuthStep::Rejected(AuthError::ServerRejected {
                code: err.code,
                state: err.sql_state,
                message: err.message,
            })
        }
        ServerResponse::AuthMoreData => {
            let Some(&code) = payload.get(1) else {
                return Err(Error::Protocol(mysql_wire::ProtocolError::UnexpectedEof));
            };
            AuthStep::Continuation(code)
        }
        ServerResponse::Eof => AuthStep::Unexpected(mysql_wire::EOF_MARKER),
        ServerResponse::Other(byte) => AuthStep::Unexpected(byte),
    })
}

/// Drive the credential exchange after the greeting has been parsed and
/// any TLS upgrade is in place.
///
/// The plaintext password lives in a [`Zeroizing`] copy for exactly the
/// duration of this exchange, covering the full-auth branch that must
/// resend it.
pub(crate) async fn run_auth<S>(
    stream: &mut PacketStream<S>,
    handshake: &Handshake,
    scheme: AuthScheme,
    credentials: &Credentials,
    capabilities: CapabilityFlags,
    charset: u8,
    secure_channel: bool,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let password = Zeroizing::new(credentials.password().to_string());

    let scramble = match scheme {
        AuthScheme::NativePassword => native_password_scramble(&password, &handshake.seed),
        AuthScheme::CachingSha2 | AuthScheme::Sha256Password => {
            caching_sha2_scramble(&password, &handshake.seed)
        }
    };

    let mut body = BytesMut::new();
    HandshakeResponse {
        capabilities,
        charset,
        user: credentials.user(),
        scramble: &scramble,
        database: credentials.database(),
        auth_plugin: scheme.plugin_name(),
    }
    .encode(&mut body);
    stream.write_packet(&body).await?;

    loop {
        let step = {
            let payload = stream.read_packet().await?;
            classify_auth_packet(payload)?
        };

        match step {
            AuthStep::Accepted => return Ok(()),
            AuthStep::Rejected(err) => return Err(Error::Authentication(err)),
            AuthStep::Continuation(code) if scheme.may_require_full_auth() => match code {
                continuation::FAST_AUTH_DONE => {
                    tracing::debug!("fast auth accepted, awaiting final status");
                }
                continuation::FULL_AUTH_REQUIRED => {
                    tracing::debug!(secure_channel, "full auth required");
                    if secure_channel {
                        let mut plaintext =
                            Zeroizing::new(Vec::with_capacity(password.len() + 1));
                        plaintext.extend_from_slice(password.as_bytes());
                        plaintext.push(0);
                        stream.write_packet(&plaintext).await?;
                    } else {
                        stream
                            .write_packet(&[continuation::REQUEST_SERVER_KEY])
                            .await?;
                        let pem = {
                            let payload = stream.read_packet().await?;
                            match payload.split_first() {
                                Some((&AUTH_MORE_DATA_MARKER, key)) => key.to_vec(),
                                Some((&first, _)) => {
                                    return Err(Error::Authentication(
                                        AuthError::UnexpectedResponse(first),
                                    ));
                                }
                                None => {
                                    return Err(Error::Protocol(
                                        mysql_wire::ProtocolError::UnexpectedEof,
                                    ));
                                }
                            }
                        };
                        let ciphertext =
                            encrypt_password_with_server_key(&password, &handshake.seed, &pem)
                                .map_err(Error::Authentication)?;
                        stream.write_packet(&ciphertext).await?;
                    }
                }
                other => {
                    return Err(Error::Authentication(AuthError::UnexpectedContinuation(
                        other,
                    )));
                }
            },
            AuthStep::Continuation(_) => {
                return Err(Error::Authentication(AuthError::UnexpectedResponse(
                    AUTH_MORE_DATA_MARKER,
                )));
            }
            AuthStep::Unexpected(byte) => {
                return Err(Error::Authentication(AuthError::UnexpectedResponse(byte)));
            }
        }
    }
}
