//! Control byte constants for the rlogin protocol.
//!
//! RFC 1282 defines two kinds of in-band control traffic on top of the raw
//! byte relay:
//!
//! - **Client-side flow control and escapes**: bytes the client scans for in
//!   its own keyboard input before forwarding (DC1/DC3 flow control, the
//!   escape prefix, line boundaries).
//! - **Server control bytes**: single bytes the server sends in conjunction
//!   with the TCP urgent-data pointer to change client behavior
//!   (DISCARD/RAW/COOKED/WINDOW). See [`ServerControl`].

/// CAN (Ctrl-X) - the line-cancel byte; re-arms escape watching.
pub const CAN: u8 = 0x18;

/// Carriage return.
pub const CR: u8 = 0x0D;

/// DC1 (XON) - resume output in cooked mode.
pub const DC1: u8 = 0x11;

/// DC3 (XOFF) - suspend output in cooked mode.
pub const DC3: u8 = 0x13;

/// `.` - default escape command: disconnect.
pub const DOT: u8 = 0x2E;

/// EOM (Ctrl-Y) - default escape command: toggle input suspension only.
pub const EOM: u8 = 0x19;

/// EOT (Ctrl-D) - default escape command: disconnect.
pub const EOT: u8 = 0x04;

/// Line feed.
pub const LF: u8 = 0x0A;

/// NUL - the handshake field separator and the success reply byte.
pub const NUL: u8 = 0x00;

/// SUB (Ctrl-Z) - default escape command: toggle both suspensions.
pub const SUB: u8 = 0x1A;

/// Server control byte: discard buffered output (RFC 1282 "02").
pub const DISCARD: u8 = 0x02;

/// Server control byte: switch the client to raw mode (RFC 1282 "10").
pub const RAW: u8 = 0x10;

/// Server control byte: switch the client to cooked mode (RFC 1282 "20").
pub const COOKED: u8 = 0x20;

/// Server control byte: request a window-change control sequence (RFC 1282 "80").
pub const WINDOW: u8 = 0x80;

/// A control byte received on the server's urgent-data channel.
///
/// These bytes only carry control meaning when the transport flags them as
/// urgent data; in the normal stream they are ordinary payload. The inbound
/// scanner that interprets them is therefore capability-gated on the client
/// side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerControl {
    /// Discard all output buffered but not yet displayed.
    Discard,
    /// Stop interpreting DC1/DC3 flow control locally.
    RawMode,
    /// Resume interpreting DC1/DC3 flow control locally.
    CookedMode,
    /// Send the server a window-change control sequence.
    WindowSizeRequest,
}

impl ServerControl {
    /// Convert a byte to a `ServerControl` if it denotes a control operation.
    ///
    /// # Examples
    ///
    /// ```
    /// use rlogin_protocol::control::ServerControl;
    ///
    /// assert_eq!(ServerControl::from_byte(0x80), Some(ServerControl::WindowSizeRequest));
    /// assert_eq!(ServerControl::from_byte(0x41), None);
    /// ```
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            DISCARD => Some(Self::Discard),
            RAW => Some(Self::RawMode),
            COOKED => Some(Self::CookedMode),
            WINDOW => Some(Self::WindowSizeRequest),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_control_from_byte() {
        assert_eq!(ServerControl::from_byte(DISCARD), Some(ServerControl::Discard));
        assert_eq!(ServerControl::from_byte(RAW), Some(ServerControl::RawMode));
        assert_eq!(ServerControl::from_byte(COOKED), Some(ServerControl::CookedMode));
        assert_eq!(
            ServerControl::from_byte(WINDOW),
            Some(ServerControl::WindowSizeRequest)
        );
    }

    #[test]
    fn test_data_bytes_are_not_control() {
        for byte in [NUL, CR, LF, CAN, DC1, DC3, DOT, b'a', 0xFF] {
            assert_eq!(ServerControl::from_byte(byte), None, "byte {byte:#04x}");
        }
    }
}
