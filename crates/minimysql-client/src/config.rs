//! Client configuration.

use std::time::Duration;

use minimysql_auth::Credentials;
use minimysql_tls::TlsConfig;
use mysql_wire::DEFAULT_CHARSET;

use crate::error::Error;

/// Timeout configuration for the connection phases.
///
/// Packet reads on a plaintext channel use a shorter deadline than reads
/// on an encrypted channel, matching the extra latency of the record
/// layer on constrained links.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Time to establish one TCP connection attempt (default: 10s).
    pub connect_timeout: Duration,
    /// Deadline per plaintext packet read (default: 6s).
    pub plain_read_timeout: Duration,
    /// Deadline per encrypted packet read (default: 10s).
    pub secure_read_timeout: Duration,
    /// Time to complete the TLS handshake (default: 10s).
    pub tls_handshake_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            plain_read_timeout: Duration::from_secs(6),
            secure_read_timeout: Duration::from_secs(10),
            tls_handshake_timeout: Duration::from_secs(10),
        }
    }
}

impl TimeoutConfig {
    /// Create a new timeout configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TCP connection timeout per attempt.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-packet read deadline on a plaintext channel.
    #[must_use]
    pub fn plain_read_timeout(mut self, timeout: Duration) -> Self {
        self.plain_read_timeout = timeout;
        self
    }

    /// Set the per-packet read deadline on an encrypted channel.
    #[must_use]
    pub fn secure_read_timeout(mut self, timeout: Duration) -> Self {
        self.secure_read_timeout = timeout;
        self
    }

    /// Set the TLS handshake timeout.
    #[must_use]
    pub fn tls_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.tls_handshake_timeout = timeout;
        self
    }
}

/// Whether and how to upgrade the channel to TLS before authenticating.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Never upgrade; authenticate in cleartext.
    #[default]
    Disabled,
    /// Upgrade when the server advertises TLS support; otherwise proceed
    /// in cleartext with a warning.
    Preferred(TlsConfig),
    /// Upgrade or fail: a server without TLS support is a configuration
    /// error.
    Required(TlsConfig),
}

impl TlsMode {
    /// Whether an upgrade will be attempted when the server supports it.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Configuration for a client connection.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server hostname or address.
    pub host: String,
    /// Server port (default: 3306).
    pub port: u16,
    /// Account credentials.
    pub credentials: Credentials,
    /// TLS upgrade policy.
    pub tls: TlsMode,
    /// Phase timeouts.
    pub timeouts: TimeoutConfig,
    /// Bounded TCP connect attempts (default: 10).
    pub connect_attempts: u32,
    /// Fixed delay between connect attempts (default: 1s).
    pub connect_retry_delay: Duration,
    /// Charset byte sent in the handshake response (default: 8, latin1).
    pub charset: u8,
}

impl Config {
    /// Create a configuration for the given server and account.
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            host: host.into(),
            port: 3306,
            credentials,
            tls: TlsMode::Disabled,
            timeouts: TimeoutConfig::default(),
            connect_attempts: 10,
            connect_retry_delay: Duration::from_secs(1),
            charset: DEFAULT_CHARSET,
        }
    }

    /// Set the server port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the TLS upgrade policy.
    #[must_use]
    pub fn tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    /// Set the phase timeouts.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set the bounded TCP connect attempt count.
    #[must_use]
    pub fn connect_attempts(mut self, attempts: u32) -> Self {
        self.connect_attempts = attempts;
        self
    }

    /// Set the delay between connect attempts.
    #[must_use]
    pub fn connect_retry_delay(mut self, delay: Duration) -> Self {
        self.connect_retry_delay = delay;
        self
    }

    /// Set the handshake charset byte.
    #[must_use]
    pub fn charset(mut self, charset: u8) -> Self {
        self.charset = charset;
        self
    }

    /// Validate the configuration before connecting.
    pub fn validate(&self) -> Result<(), Error> {
        if self.host.is_empty() {
            return Err(Error::Config("host must not be empty".into()));
        }
        if self.connect_attempts == 0 {
            return Err(Error::Config("connect_attempts must be at least 1".into()));
        }
        Ok(())
    }
}
