//! Byte classification for both directions of the session.
//!
//! The outbound scanner is the heart of the client: every byte the consumer
//! submits is classified as plain data, flow control, an escape-prefixed
//! command, or a line-boundary marker, with side effects on the session
//! flags and the escape registry. The inbound side is a suspension gate plus
//! the capability-gated control-byte scanner for the server's urgent-data
//! channel.

use crate::escape::{EscapeContext, EscapeRegistry};
use crate::session::SessionState;
use bytes::{BufMut, Bytes, BytesMut};
use rlogin_protocol::control::{self, ServerControl};

/// Result of scanning one chunk of consumer input.
pub(crate) struct OutboundScan {
    /// The bytes that survived classification, in input order.
    pub(crate) forward: Bytes,
    /// An escape action requested disconnect.
    pub(crate) disconnect: bool,
}

/// Scan consumer input left to right.
///
/// Classification per byte:
/// 1. The escape character, while watching for one: consumed; the next byte
///    becomes an escape command.
/// 2. An escape command byte: consumed whether or not an action is bound;
///    a bound action runs synchronously.
/// 3. DC1/DC3 in cooked mode: consumed; DC1 resumes output delivery, DC3
///    suspends it.
/// 4. Anything else is forwarded. A LF directly after a CR, or a CAN
///    anywhere, re-arms escape watching; any other forwarded byte disarms
///    it.
///
/// `watching_for_escape` and `escape_pending` live in [`SessionState`] and
/// persist across calls, so sequences split over several chunks are still
/// recognized. The previous-byte tracking used for CR,LF detection is local
/// to one call: a pair split across chunks does not re-arm.
pub(crate) fn scan_outbound(
    state: &mut SessionState,
    escapes: &mut EscapeRegistry,
    escape_byte: u8,
    data: &[u8],
) -> OutboundScan {
    let mut forward = BytesMut::with_capacity(data.len());
    let mut disconnect = false;
    let mut prev: Option<u8> = None;

    for &byte in data {
        if state.watching_for_escape && byte == escape_byte {
            state.watching_for_escape = false;
            state.escape_pending = true;
        } else if state.escape_pending {
            state.escape_pending = false;
            let mut ctx = EscapeContext::new(state);
            escapes.invoke(byte, &mut ctx);
            if ctx.disconnect_requested() {
                disconnect = true;
            }
        } else if state.cooked && (byte == control::DC1 || byte == control::DC3) {
            state.output_suspended = byte == control::DC3;
        } else {
            // Arming is one-shot: a forwarded byte spends it unless it is
            // itself a line boundary. Consumed bytes above leave it alone.
            state.watching_for_escape =
                (prev == Some(control::CR) && byte == control::LF) || byte == control::CAN;
            forward.put_u8(byte);
        }
        prev = Some(byte);
    }

    OutboundScan {
        forward: forward.freeze(),
        disconnect,
    }
}

/// Result of filtering one inbound chunk.
pub(crate) struct InboundScan {
    /// Data to hand to the consumer; `None` while output is suspended.
    pub(crate) deliver: Option<Bytes>,
    /// A WINDOW control byte asked for the terminal size.
    pub(crate) send_window_size: bool,
}

/// Filter a chunk arriving from the server.
///
/// With `scan_controls` unset this is a pure suspension gate. When set, the
/// chunk is searched for a single control byte: DISCARD throws away the
/// bytes accumulated so far, RAW and COOKED flip flow-control
/// interpretation, WINDOW requests a window-change control sequence. Once
/// one control byte has been consumed, the remainder of the chunk is plain
/// data.
pub(crate) fn scan_inbound(
    state: &mut SessionState,
    data: &[u8],
    scan_controls: bool,
) -> InboundScan {
    let mut send_window_size = false;

    let payload = if scan_controls {
        let mut looking = true;
        let mut kept = BytesMut::with_capacity(data.len());
        for &byte in data {
            if !looking {
                kept.put_u8(byte);
                continue;
            }
            match ServerControl::from_byte(byte) {
                Some(ServerControl::Discard) => {
                    kept.clear();
                    looking = false;
                }
                Some(ServerControl::RawMode) => {
                    state.cooked = false;
                    looking = false;
                }
                Some(ServerControl::CookedMode) => {
                    state.cooked = true;
                    looking = false;
                }
                Some(ServerControl::WindowSizeRequest) => {
                    send_window_size = true;
                    looking = false;
                }
                None => kept.put_u8(byte),
            }
        }
        kept.freeze()
    } else {
        Bytes::copy_from_slice(data)
    };

    let deliver = (!state.output_suspended).then_some(payload);

    InboundScan {
        deliver,
        send_window_size,
    }
}
