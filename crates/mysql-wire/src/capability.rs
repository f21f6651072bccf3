//! Client/server capability flags.

use bitflags::bitflags;

bitflags! {
    /// MySQL capability flags exchanged during the handshake.
    ///
    /// The server advertises its capabilities split across two 16-bit words
    /// in the handshake packet; the client echoes the subset it wants as a
    /// single 32-bit word in the handshake response.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CapabilityFlags: u32 {
        /// Use the improved version of Old Password Authentication.
        const LONG_PASSWORD = 0x0000_0001;
        /// Send found rows instead of affected rows.
        const FOUND_ROWS = 0x0000_0002;
        /// Get all column flags.
        const LONG_FLAG = 0x0000_0004;
        /// Database name can be specified on connect.
        const CONNECT_WITH_DB = 0x0000_0008;
        /// Compression protocol supported.
        const COMPRESS = 0x0000_0020;
        /// Ignore spaces before '('.
        const IGNORE_SPACE = 0x0000_0100;
        /// New 4.1 protocol.
        const PROTOCOL_41 = 0x0000_0200;
        /// Interactive client; server uses `interactive_timeout`.
        const INTERACTIVE = 0x0000_0400;
        /// Switch to TLS after sending the upgrade-request packet.
        const SSL = 0x0000_0800;
        /// Client knows about transactions.
        const TRANSACTIONS = 0x0000_2000;
        /// New 4.1 authentication.
        const SECURE_CONNECTION = 0x0000_8000;
        /// Multiple statements per query.
        const MULTI_STATEMENTS = 0x0001_0000;
        /// Multiple result sets per query.
        const MULTI_RESULTS = 0x0002_0000;
        /// Client supports pluggable authentication.
        const PLUGIN_AUTH = 0x0008_0000;
    }
}

impl CapabilityFlags {
    /// Base flags sent by this client in every handshake response.
    #[must_use]
    pub fn client_base() -> Self {
        Self::LONG_PASSWORD
            | Self::LONG_FLAG
            | Self::CONNECT_WITH_DB
            | Self::PROTOCOL_41
            | Self::INTERACTIVE
            | Self::TRANSACTIONS
            | Self::SECURE_CONNECTION
            | Self::MULTI_STATEMENTS
            | Self::MULTI_RESULTS
            | Self::PLUGIN_AUTH
    }

    /// Combine the two 16-bit capability words from the handshake packet.
    #[must_use]
    pub fn from_halves(low: u16, high: u16) -> Self {
        Self::from_bits_retain(u32::from(low) | (u32::from(high) << 16))
    }

    /// Whether the server advertises TLS support.
    #[must_use]
    pub fn supports_ssl(&self) -> bool {
        self.contains(Self::SSL)
    }
}
