//! Buffered I/O streams for rlogin protocol communication.
//!
//! rlogin is a relay protocol: after the handshake, both directions carry
//! opaque byte chunks rather than framed messages. The read side therefore
//! yields whole chunks as they arrive, and the write side buffers bytes
//! (including the little-endian 16-bit fields of the window-change control
//! sequence) until flushed.
//!
//! # Examples
//!
//! ```no_run
//! use rlogin_protocol::io::{RloginInStream, RloginOutStream};
//! use tokio::net::TcpStream;
//!
//! # async fn example() -> std::io::Result<()> {
//! let stream = TcpStream::connect("localhost:513").await?;
//! let (reader, writer) = stream.into_split();
//!
//! let mut input = RloginInStream::new(reader);
//! let mut output = RloginOutStream::new(writer);
//!
//! output.write_bytes(b"ls\r\n");
//! output.flush().await?;
//!
//! while let Some(chunk) = input.read_chunk().await? {
//!     println!("received {} bytes", chunk.len());
//! }
//! # Ok(())
//! # }
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Buffered input stream yielding rlogin data chunks.
///
/// Each call to [`read_chunk()`](Self::read_chunk) performs at most one read
/// on the underlying stream and returns whatever arrived, preserving the
/// chunk boundaries the transport delivered. `None` signals end of stream.
pub struct RloginInStream<R> {
    reader: R,
    buffer: BytesMut,
}

impl<R: AsyncRead + Unpin> RloginInStream<R> {
    /// Create a new input stream with default buffer size (8KB).
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, 8192)
    }

    /// Create a new input stream with the given buffer capacity.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Read the next chunk of data from the stream.
    ///
    /// Returns `Ok(None)` once the peer has closed the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    pub async fn read_chunk(&mut self) -> std::io::Result<Option<Bytes>> {
        let bytes_read = self.reader.read_buf(&mut self.buffer).await?;
        if bytes_read == 0 {
            return Ok(None);
        }
        Ok(Some(self.buffer.split().freeze()))
    }

    /// Get a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Consume the stream and return the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Buffered output stream for writing rlogin protocol data.
///
/// Writes are buffered internally and only hit the wire on
/// [`flush()`](Self::flush). Multi-byte fields are written little-endian as
/// RFC 1282 requires for the window-change control sequence.
pub struct RloginOutStream<W> {
    writer: W,
    buffer: BytesMut,
}

impl<W: AsyncWrite + Unpin> RloginOutStream<W> {
    /// Create a new output stream with default buffer size (8KB).
    pub fn new(writer: W) -> Self {
        Self::with_capacity(writer, 8192)
    }

    /// Create a new output stream with the given buffer capacity.
    pub fn with_capacity(writer: W, capacity: usize) -> Self {
        Self {
            writer,
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Write a single byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.put_u8(value);
    }

    /// Write a 16-bit unsigned integer in little-endian byte order.
    pub fn write_u16_le(&mut self, value: u16) {
        self.buffer.put_u16_le(value);
    }

    /// Write a byte slice to the buffer.
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Flush all buffered data to the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or the writer's own `flush` fails.
    pub async fn flush(&mut self) -> std::io::Result<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all(&self.buffer).await?;
            self.buffer.clear();
        }
        self.writer.flush().await
    }

    /// Flush any buffered data and shut down the write side of the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or the shutdown fails.
    pub async fn shutdown(&mut self) -> std::io::Result<()> {
        self.flush().await?;
        self.writer.shutdown().await
    }

    /// Get the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Get a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consume the stream and return the underlying writer.
    ///
    /// **Warning:** buffered data is lost; call [`flush()`](Self::flush)
    /// first if it matters.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_buffers_until_flush() {
        let (client, server) = tokio::io::duplex(64);
        let mut output = RloginOutStream::new(client);
        let mut input = RloginInStream::new(server);

        output.write_u8(0x18);
        output.write_u16_le(0x1234);
        output.write_bytes(b"ok");
        assert_eq!(output.buffered(), 5);

        output.flush().await.unwrap();
        assert_eq!(output.buffered(), 0);

        let chunk = input.read_chunk().await.unwrap().unwrap();
        assert_eq!(&chunk[..], &[0x18, 0x34, 0x12, b'o', b'k']);
    }

    #[tokio::test]
    async fn test_read_chunk_returns_none_at_eof() {
        let (client, server) = tokio::io::duplex(64);
        let mut input = RloginInStream::new(server);
        drop(client);
        assert!(input.read_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_preserves_chunk_boundaries() {
        let (client, server) = tokio::io::duplex(64);
        let mut output = RloginOutStream::new(client);
        let mut input = RloginInStream::new(server);

        output.write_bytes(b"first");
        output.flush().await.unwrap();
        let chunk = input.read_chunk().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"first");

        output.write_bytes(b"second");
        output.flush().await.unwrap();
        let chunk = input.read_chunk().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"second");
    }

    #[tokio::test]
    async fn test_flush_of_empty_buffer_is_noop() {
        let (client, _server) = tokio::io::duplex(64);
        let mut output = RloginOutStream::new(client);
        output.flush().await.unwrap();
        assert_eq!(output.buffered(), 0);
    }
}
