//! Command packets (client to server).

use bytes::BufMut;

/// Text-protocol command bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Close the connection.
    Quit = 0x01,
    /// Execute a text statement.
    Query = 0x03,
}

impl Command {
    /// Encode a command payload: the command byte followed by its argument.
    pub fn encode(self, argument: &[u8], dst: &mut impl BufMut) {
        dst.put_u8(self as u8);
        dst.put_slice(argument);
    }
}
