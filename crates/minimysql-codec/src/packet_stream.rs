//! Packet framing over an async byte stream.

use std::time::Duration;

use bytes::BytesMut;
use mysql_wire::{PacketHeader, MAX_PACKET_PAYLOAD, PACKET_HEADER_LEN};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::error::CodecError;

/// Buffer and sequence state detached from a [`PacketStream`].
///
/// Produced by [`PacketStream::into_parts`] so a mid-connection TLS
/// upgrade can re-wrap the same state around the encrypted stream.
#[derive(Debug)]
pub struct StreamParts {
    recv: BytesMut,
    sequence_id: u8,
}

/// Framed MySQL packet stream.
///
/// Owns the connection's one receive buffer. The buffer is sized from the
/// largest packet seen so far and never shrinks; each `read_packet` call
/// replaces the previous packet, so at most one packet is buffered at a
/// time.
pub struct PacketStream<T> {
    stream: T,
    recv: BytesMut,
    sequence_id: u8,
    read_timeout: Duration,
}

impl<T> PacketStream<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a stream with an empty receive buffer.
    pub fn new(stream: T, read_timeout: Duration) -> Self {
        Self {
            stream,
            recv: BytesMut::new(),
            sequence_id: 0,
            read_timeout,
        }
    }

    /// Re-wrap a stream around previously detached state.
    pub fn from_parts(stream: T, parts: StreamParts, read_timeout: Duration) -> Self {
        Self {
            stream,
            recv: parts.recv,
            sequence_id: parts.sequence_id,
            read_timeout,
        }
    }

    /// Release the inner stream, keeping buffer and sequence state.
    pub fn into_parts(self) -> (T, StreamParts) {
        (
            self.stream,
            StreamParts {
                recv: self.recv,
                sequence_id: self.sequence_id,
            },
        )
    }

    /// The sequence id the next outgoing packet will carry.
    #[must_use]
    pub fn sequence_id(&self) -> u8 {
        self.sequence_id
    }

    /// Reset the outgoing sequence counter (start of a new exchange).
    pub fn reset_sequence(&mut self, id: u8) {
        self.sequence_id = id;
    }

    /// High-water size of the receive buffer (`length + 4` of the largest
    /// packet seen). Grows monotonically.
    #[must_use]
    pub fn buffer_high_water(&self) -> usize {
        self.recv.len()
    }

    /// Mutable access to the inner stream (shutdown on close).
    pub fn stream_mut(&mut self) -> &mut T {
        &mut self.stream
    }

    /// Read one packet under the configured deadline.
    ///
    /// Returns the payload as a borrow of the internal buffer. Any
    /// failure leaves no packet available; the caller must treat the
    /// connection attempt as terminal.
    pub async fn read_packet(&mut self) -> Result<&[u8], CodecError> {
        self.read_packet_with_timeout(self.read_timeout).await
    }

    /// Read one packet under an explicit deadline.
    ///
    /// Used with a short deadline to probe for trailing status packets
    /// after a result set.
    pub async fn read_packet_with_timeout(
        &mut self,
        deadline: Duration,
    ) -> Result<&[u8], CodecError> {
        let len = timeout(deadline, Self::read_into(&mut self.stream, &mut self.recv))
            .await
            .map_err(|_| CodecError::Timeout(deadline))??;

        let header = PacketHeader::decode(&mut &self.recv[..PACKET_HEADER_LEN])?;
        self.sequence_id = header.sequence_id.wrapping_add(1);

        tracing::trace!(
            length = len,
            sequence_id = header.sequence_id,
            "read packet"
        );

        Ok(&self.recv[PACKET_HEADER_LEN..PACKET_HEADER_LEN + len])
    }

    /// Read header and payload into `recv`, growing it to `length + 4`.
    async fn read_into(stream: &mut T, recv: &mut BytesMut) -> Result<usize, CodecError> {
        let mut header_buf = [0u8; PACKET_HEADER_LEN];
        stream
            .read_exact(&mut header_buf)
            .await
            .map_err(map_closed)?;

        let header = PacketHeader::decode(&mut &header_buf[..])?;
        header.check_length()?;

        let total = header.total_len();
        if recv.len() < total {
            recv.resize(total, 0);
        }
        recv[..PACKET_HEADER_LEN].copy_from_slice(&header_buf);

        if header.length > 0 {
            stream
                .read_exact(&mut recv[PACKET_HEADER_LEN..total])
                .await
                .map_err(map_closed)?;
        }

        Ok(header.length)
    }

    /// Frame and write one packet with the current sequence id.
    ///
    /// Succeeds only if every byte was accepted; the sequence counter
    /// advances after a successful write.
    pub async fn write_packet(&mut self, payload: &[u8]) -> Result<(), CodecError> {
        if payload.len() > MAX_PACKET_PAYLOAD {
            return Err(CodecError::WriteTooLarge {
                size: payload.len(),
                max: MAX_PACKET_PAYLOAD,
            });
        }

        let mut frame = BytesMut::with_capacity(PACKET_HEADER_LEN + payload.len());
        PacketHeader::new(payload.len(), self.sequence_id).encode(&mut frame);
        frame.extend_from_slice(payload);

        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;

        tracing::trace!(
            length = payload.len(),
            sequence_id = self.sequence_id,
            "wrote packet"
        );

        self.sequence_id = self.sequence_id.wrapping_add(1);
        Ok(())
    }
}

fn map_closed(e: std::io::Error) -> CodecError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        CodecError::ConnectionClosed
    } else {
        CodecError::Io(e)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(500);

    #[tokio::test]
    async fn test_loopback_roundtrip() {
        let (client, server) = tokio::io::duplex(4096);
        let mut tx = PacketStream::new(client, TIMEOUT);
        let mut rx = PacketStream::new(server, TIMEOUT);

        tx.reset_sequence(1);
        tx.write_packet(b"hello").await.unwrap();

        let payload = rx.read_packet().await.unwrap();
        assert_eq!(payload, b"hello");
        // The reader's counter follows the peer's sequence id.
        assert_eq!(rx.sequence_id(), 2);
    }

    #[tokio::test]
    async fn test_empty_payload() {
        let (client, server) = tokio::io::duplex(64);
        let mut tx = PacketStream::new(client, TIMEOUT);
        let mut rx = PacketStream::new(server, TIMEOUT);

        tx.write_packet(&[]).await.unwrap();
        let payload = rx.read_packet().await.unwrap();
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn test_buffer_grows_monotonically() {
        let (client, server) = tokio::io::duplex(8192);
        let mut tx = PacketStream::new(client, TIMEOUT);
        let mut rx = PacketStream::new(server, TIMEOUT);

        for len in [10usize, 100, 50, 1000, 200] {
            tx.write_packet(&vec![0xab; len]).await.unwrap();
            let payload = rx.read_packet().await.unwrap();
            assert_eq!(payload.len(), len);
        }

        // High-water mark equals the largest length + 4 observed.
        assert_eq!(rx.buffer_high_water(), 1000 + PACKET_HEADER_LEN);
    }

    #[tokio::test]
    async fn test_oversize_write_rejected() {
        let (client, _server) = tokio::io::duplex(64);
        let mut tx = PacketStream::new(client, TIMEOUT);

        let err = tx
            .write_packet(&vec![0; MAX_PACKET_PAYLOAD + 1])
            .await
            .unwrap_err();
        assert!(matches!(err, CodecError::WriteTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_oversize_read_rejected() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut rx = PacketStream::new(client, TIMEOUT);

        // Header declaring a payload beyond the transmission bound.
        server.write_all(&[0xdd, 0x05, 0x00, 0x00]).await.unwrap();

        let err = rx.read_packet().await.unwrap_err();
        assert!(matches!(
            err,
            CodecError::Protocol(mysql_wire::ProtocolError::PacketTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let (client, _server) = tokio::io::duplex(64);
        let mut rx = PacketStream::new(client, Duration::from_millis(20));

        let err = rx.read_packet().await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_short_read_is_connection_closed() {
        let (client, mut server) = tokio::io::duplex(64);
        let mut rx = PacketStream::new(client, TIMEOUT);

        // Header promises 8 bytes; only 3 arrive before the peer closes.
        server.write_all(&[0x08, 0x00, 0x00, 0x00, 1, 2, 3]).await.unwrap();
        drop(server);

        let err = rx.read_packet().await.unwrap_err();
        assert!(matches!(err, CodecError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_sequence_increments_per_write() {
        let (client, server) = tokio::io::duplex(1024);
        let mut tx = PacketStream::new(client, TIMEOUT);
        let mut rx = PacketStream::new(server, TIMEOUT);

        tx.reset_sequence(0);
        tx.write_packet(b"a").await.unwrap();
        tx.write_packet(b"b").await.unwrap();
        assert_eq!(tx.sequence_id(), 2);

        rx.read_packet().await.unwrap();
        let _ = rx.read_packet().await.unwrap();
        assert_eq!(rx.sequence_id(), 2);
    }

    #[tokio::test]
    async fn test_parts_preserve_state() {
        let (client, server) = tokio::io::duplex(1024);
        let mut tx = PacketStream::new(client, TIMEOUT);
        let mut rx = PacketStream::new(server, TIMEOUT);

        tx.reset_sequence(1);
        tx.write_packet(&[0u8; 300]).await.unwrap();
        rx.read_packet().await.unwrap();

        let high_water = rx.buffer_high_water();
        let seq = rx.sequence_id();

        let (stream, parts) = rx.into_parts();
        let rx = PacketStream::from_parts(stream, parts, TIMEOUT);

        assert_eq!(rx.buffer_high_water(), high_water);
        assert_eq!(rx.sequence_id(), seq);
    }
}
