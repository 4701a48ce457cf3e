//! Application-facing message types for communication between the client and
//! the consumer.

use crate::escape::{EscapeAction, EscapeKey};
use bytes::Bytes;
use std::fmt;

/// Events sent from the rlogin client to the consumer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The server answered the connection request.
    ///
    /// `success` is true when the handshake reply byte was zero. On failure
    /// the transport is closed immediately afterwards without a separate
    /// [`Disconnected`](Self::Disconnected) event, since the session was
    /// never established.
    ConnectionResult {
        /// Whether the server accepted the login.
        success: bool,
    },

    /// Session data received from the server.
    Data {
        /// The received bytes, exactly as delivered by the transport.
        payload: Bytes,
    },

    /// The session has ended.
    ///
    /// Emitted exactly once per established session, whether the close was
    /// initiated locally (escape command, [`disconnect`]) or by the server.
    ///
    /// [`disconnect`]: crate::ClientHandle::disconnect
    Disconnected,

    /// An advisory error occurred.
    ///
    /// The session continues; the consumer decides whether to treat the
    /// error as fatal.
    Error {
        /// The error message.
        message: String,
    },
}

/// Commands sent from the consumer to the rlogin client.
pub enum ClientCommand {
    /// Send bytes to the server, subject to outbound filtering.
    Send(Bytes),

    /// Send a window-change control sequence (no-op while not connected).
    SendWindowSize,

    /// Update the terminal row count.
    SetRows(u16),

    /// Update the terminal column count.
    SetColumns(u16),

    /// Update the terminal width in pixels.
    SetPixelsX(u16),

    /// Update the terminal height in pixels.
    SetPixelsY(u16),

    /// Change the escape character.
    SetEscapeChar(char),

    /// Bind an escape action, replacing any existing binding for the key.
    RegisterEscape {
        /// The byte the action is bound to.
        key: EscapeKey,
        /// The action to run when the escape sequence fires.
        action: EscapeAction,
    },

    /// Close the connection.
    Disconnect,
}

impl fmt::Debug for ClientCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send(data) => f.debug_tuple("Send").field(&data.len()).finish(),
            Self::SendWindowSize => write!(f, "SendWindowSize"),
            Self::SetRows(rows) => f.debug_tuple("SetRows").field(rows).finish(),
            Self::SetColumns(columns) => f.debug_tuple("SetColumns").field(columns).finish(),
            Self::SetPixelsX(pixels) => f.debug_tuple("SetPixelsX").field(pixels).finish(),
            Self::SetPixelsY(pixels) => f.debug_tuple("SetPixelsY").field(pixels).finish(),
            Self::SetEscapeChar(ch) => f.debug_tuple("SetEscapeChar").field(ch).finish(),
            Self::RegisterEscape { key, .. } => {
                f.debug_struct("RegisterEscape").field("key", key).finish_non_exhaustive()
            }
            Self::Disconnect => write!(f, "Disconnect"),
        }
    }
}
