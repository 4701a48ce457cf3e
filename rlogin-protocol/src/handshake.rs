//! rlogin connection handshake.
//!
//! The handshake is a single unprompted write from the client followed by a
//! single reply byte from the server (RFC 1282, "Connection Establishment"):
//!
//! 1. The client sends four NUL-terminated fields:
//!    `NUL client-user-name NUL server-user-name NUL terminal-type '/' terminal-speed NUL`
//!    where the terminal speed is rendered as decimal text.
//! 2. The server answers with a single zero byte to accept the connection.
//!    Any other first byte is a rejection; historically the remainder of a
//!    rejection is an error message, but the connection is torn down either
//!    way.
//!
//! No further negotiation takes place; everything after the reply byte is
//! session data.

use crate::io::RloginOutStream;
use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::AsyncWrite;

/// The connection request sent immediately after transport establishment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    /// User name on the client machine.
    pub client_username: String,
    /// User name to log in as on the server.
    pub server_username: String,
    /// Terminal type string, e.g. `xterm`.
    pub terminal_type: String,
    /// Terminal speed in bits per second, sent as decimal text.
    pub terminal_speed: u32,
}

impl ConnectionRequest {
    /// Encode the request into its wire form.
    pub fn encode(&self) -> Bytes {
        let speed = self.terminal_speed.to_string();
        let mut buf = BytesMut::with_capacity(
            4 + self.client_username.len()
                + self.server_username.len()
                + self.terminal_type.len()
                + 1
                + speed.len(),
        );
        buf.put_u8(0);
        buf.put_slice(self.client_username.as_bytes());
        buf.put_u8(0);
        buf.put_slice(self.server_username.as_bytes());
        buf.put_u8(0);
        buf.put_slice(self.terminal_type.as_bytes());
        buf.put_u8(b'/');
        buf.put_slice(speed.as_bytes());
        buf.put_u8(0);
        buf.freeze()
    }
}

/// The server's verdict on a connection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeReply {
    /// First reply byte was zero: the session is established.
    Accepted,
    /// First reply byte was nonzero: the request was refused.
    Refused(u8),
}

impl HandshakeReply {
    /// Interpret the first byte the server sends after the request.
    pub fn from_byte(byte: u8) -> Self {
        if byte == 0 {
            Self::Accepted
        } else {
            Self::Refused(byte)
        }
    }

    /// True if the reply establishes the session.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Write a connection request and flush.
///
/// The request expects no acknowledgement of its own; the server's reply
/// byte arrives with (or ahead of) the first session data.
///
/// # Errors
///
/// Returns an error if the underlying write fails.
pub async fn write_connection_request<W: AsyncWrite + Unpin>(
    outstream: &mut RloginOutStream<W>,
    request: &ConnectionRequest,
) -> std::io::Result<()> {
    outstream.write_bytes(&request.encode());
    outstream.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::RloginInStream;

    fn request() -> ConnectionRequest {
        ConnectionRequest {
            client_username: "alice".into(),
            server_username: "bob".into(),
            terminal_type: "xterm".into(),
            terminal_speed: 9600,
        }
    }

    #[test]
    fn test_request_wire_format() {
        assert_eq!(&request().encode()[..], b"\0alice\0bob\0xterm/9600\0");
    }

    #[test]
    fn test_request_with_empty_usernames() {
        let req = ConnectionRequest {
            client_username: String::new(),
            server_username: String::new(),
            terminal_type: "vt100".into(),
            terminal_speed: 1200,
        };
        assert_eq!(&req.encode()[..], b"\0\0\0vt100/1200\0");
    }

    #[test]
    fn test_reply_interpretation() {
        assert_eq!(HandshakeReply::from_byte(0), HandshakeReply::Accepted);
        assert!(HandshakeReply::from_byte(0).is_accepted());
        assert_eq!(HandshakeReply::from_byte(1), HandshakeReply::Refused(1));
        assert!(!HandshakeReply::from_byte(0x7F).is_accepted());
    }

    #[tokio::test]
    async fn test_write_connection_request() {
        let (client, server) = tokio::io::duplex(256);
        let mut output = RloginOutStream::new(client);
        let mut input = RloginInStream::new(server);

        write_connection_request(&mut output, &request()).await.unwrap();

        let chunk = input.read_chunk().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"\0alice\0bob\0xterm/9600\0");
    }
}
