//! Transport layer for rlogin connections.
//!
//! rlogin runs over a plain TCP stream (the protocol predates transport
//! encryption; secure deployments tunnel the whole session). This module
//! owns connection establishment and splits the stream into the buffered
//! protocol streams used by the rest of the crate.
//!
//! # Examples
//!
//! ```no_run
//! use rlogin_client::transport::Transport;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Transport::connect("localhost", 513).await?;
//! let (input, output) = transport.split();
//! # Ok(())
//! # }
//! ```

use crate::errors::RloginClientError;
use rlogin_protocol::io::{RloginInStream, RloginOutStream};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// A connected rlogin transport.
pub struct Transport {
    stream: TcpStream,
}

impl Transport {
    /// Connect to an rlogin server via TCP.
    ///
    /// TCP_NODELAY is enabled: the session carries keystrokes, so latency
    /// matters more than throughput.
    ///
    /// # Errors
    ///
    /// Returns an error if DNS resolution or the connection fails, or if
    /// TCP_NODELAY cannot be set.
    pub async fn connect(host: &str, port: u16) -> Result<Self, RloginClientError> {
        let addr = format!("{}:{}", host, port);
        let stream = TcpStream::connect(&addr).await.map_err(|e| {
            RloginClientError::ConnectionFailed(format!("Failed to connect to {}: {}", addr, e))
        })?;

        stream.set_nodelay(true).map_err(|e| {
            RloginClientError::ConnectionFailed(format!("Failed to set TCP_NODELAY: {}", e))
        })?;

        // Log local and remote addresses for correlation with server logs
        if let (Ok(local), Ok(peer)) = (stream.local_addr(), stream.peer_addr()) {
            tracing::info!("Connected via TCP: local={} -> remote={}", local, peer);
        } else {
            tracing::info!("Connected to {}", addr);
        }
        Ok(Self { stream })
    }

    /// Split the transport into separate input and output streams.
    ///
    /// The halves can live on different tasks; the event loop reads and
    /// writes them from one.
    pub fn split(self) -> (RloginInStream<OwnedReadHalf>, RloginOutStream<OwnedWriteHalf>) {
        let (read, write) = self.stream.into_split();
        (RloginInStream::new(read), RloginOutStream::new(write))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_and_split() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            socket.read_exact(&mut buf).await.unwrap();
            assert_eq!(&buf, b"ping");
            socket.write_all(b"pong").await.unwrap();
        });

        let transport = Transport::connect("127.0.0.1", addr.port()).await.unwrap();
        let (mut input, mut output) = transport.split();

        output.write_bytes(b"ping");
        output.flush().await.unwrap();

        let chunk = input.read_chunk().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"pong");

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = Transport::connect("127.0.0.1", addr.port()).await;
        assert!(matches!(
            result,
            Err(RloginClientError::ConnectionFailed(_))
        ));
    }
}
