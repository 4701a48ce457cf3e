//! rlogin (RFC 1282) wire protocol implementation.
//!
//! This crate provides the wire-level protocol layer for rlogin client
//! connections: control byte constants, the connection-request encoding, the
//! window-change control sequence, and buffered stream I/O.
//!
//! # Modules
//!
//! - [`control`] - control byte constants and the server control channel
//! - [`io`] - buffered I/O streams ([`RloginInStream`], [`RloginOutStream`])
//! - [`handshake`] - connection request encoding and reply interpretation
//! - [`wccs`] - window-change control sequence encoding
//!
//! # Examples
//!
//! ```
//! use rlogin_protocol::handshake::ConnectionRequest;
//!
//! let request = ConnectionRequest {
//!     client_username: "alice".into(),
//!     server_username: "bob".into(),
//!     terminal_type: "xterm".into(),
//!     terminal_speed: 9600,
//! };
//! assert_eq!(&request.encode()[..], b"\0alice\0bob\0xterm/9600\0");
//! ```

pub mod control;
pub mod handshake;
pub mod io;
pub mod wccs;

// Re-export commonly used types
pub use handshake::{ConnectionRequest, HandshakeReply};
pub use io::{RloginInStream, RloginOutStream};
pub use wccs::WCCS_LEN;
