//! Session state and the per-chunk protocol state machine.
//!
//! [`Session`] owns everything the protocol mutates while a connection is
//! alive: the boolean session flags, the terminal properties, and the escape
//! registry. It is driven synchronously by the event loop — one call per
//! transport chunk or consumer command — and performs no I/O itself; every
//! method returns an outcome describing the writes, notifications, and
//! lifecycle transitions the caller must carry out.

use crate::config::TerminalConfig;
use crate::errors::RloginClientError;
use crate::escape::{EscapeAction, EscapeKey, EscapeRegistry};
use crate::filter;
use bytes::Bytes;
use parking_lot::Mutex;
use rlogin_common::WindowSize;
use rlogin_protocol::handshake::HandshakeReply;
use rlogin_protocol::wccs::{self, WCCS_LEN};
use std::sync::Arc;

/// The boolean flags tracked per connection attempt.
///
/// `connected` is monotonic within an attempt: false until the server's
/// zero reply byte, true until disconnect, never true again afterwards.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) connected: bool,
    pub(crate) cooked: bool,
    pub(crate) input_suspended: bool,
    pub(crate) output_suspended: bool,
    pub(crate) watching_for_escape: bool,
    pub(crate) escape_pending: bool,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        Self {
            connected: false,
            cooked: true,
            input_suspended: false,
            output_suspended: false,
            // The very first input byte of a session is a line start.
            watching_for_escape: true,
            escape_pending: false,
        }
    }
}

/// Terminal properties reported to the server, with validated setters.
///
/// Setters leave the previous value untouched when the new one is rejected.
#[derive(Debug, Clone)]
pub(crate) struct TerminalProperties {
    size: WindowSize,
    escape_char: u8,
}

impl Default for TerminalProperties {
    fn default() -> Self {
        Self {
            size: WindowSize::default(),
            escape_char: b'~',
        }
    }
}

impl TerminalProperties {
    pub(crate) fn from_config(config: &TerminalConfig) -> Result<Self, RloginClientError> {
        let mut properties = Self::default();
        properties.set_rows(config.rows)?;
        properties.set_columns(config.columns)?;
        properties.set_pixels_x(config.pixels_x)?;
        properties.set_pixels_y(config.pixels_y)?;
        properties.set_escape_char(config.escape_char)?;
        Ok(properties)
    }

    pub(crate) fn size(&self) -> WindowSize {
        self.size
    }

    pub(crate) fn rows(&self) -> u16 {
        self.size.rows
    }

    pub(crate) fn columns(&self) -> u16 {
        self.size.columns
    }

    pub(crate) fn pixels_x(&self) -> u16 {
        self.size.pixels_x
    }

    pub(crate) fn pixels_y(&self) -> u16 {
        self.size.pixels_y
    }

    pub(crate) fn escape_char(&self) -> char {
        char::from(self.escape_char)
    }

    pub(crate) fn escape_byte(&self) -> u8 {
        self.escape_char
    }

    pub(crate) fn set_rows(&mut self, rows: u16) -> Result<(), RloginClientError> {
        if rows == 0 {
            return Err(RloginClientError::Config(format!(
                "Invalid 'rows' setting {rows}"
            )));
        }
        self.size.rows = rows;
        Ok(())
    }

    pub(crate) fn set_columns(&mut self, columns: u16) -> Result<(), RloginClientError> {
        if columns == 0 {
            return Err(RloginClientError::Config(format!(
                "Invalid 'columns' setting {columns}"
            )));
        }
        self.size.columns = columns;
        Ok(())
    }

    pub(crate) fn set_pixels_x(&mut self, pixels: u16) -> Result<(), RloginClientError> {
        if pixels == 0 {
            return Err(RloginClientError::Config(format!(
                "Invalid 'pixelsX' setting {pixels}"
            )));
        }
        self.size.pixels_x = pixels;
        Ok(())
    }

    pub(crate) fn set_pixels_y(&mut self, pixels: u16) -> Result<(), RloginClientError> {
        if pixels == 0 {
            return Err(RloginClientError::Config(format!(
                "Invalid 'pixelsY' setting {pixels}"
            )));
        }
        self.size.pixels_y = pixels;
        Ok(())
    }

    pub(crate) fn set_escape_char(&mut self, ch: char) -> Result<(), RloginClientError> {
        let byte = u8::try_from(u32::from(ch)).map_err(|_| {
            RloginClientError::Config(format!("Invalid 'escapeChar' setting {ch:?}"))
        })?;
        self.escape_char = byte;
        Ok(())
    }
}

/// What the caller must do after a transport chunk was processed.
#[derive(Debug, Default)]
pub(crate) struct InboundOutcome {
    /// The handshake was resolved by this chunk.
    pub(crate) connection_result: Option<bool>,
    /// Data to deliver to the consumer.
    pub(crate) deliver: Option<Bytes>,
    /// The server requested a window-change control sequence.
    pub(crate) send_window_size: bool,
    /// The session must be torn down.
    pub(crate) disconnect: bool,
}

/// What the caller must do after consumer input was scanned.
#[derive(Debug)]
pub(crate) struct OutboundOutcome {
    /// Bytes to write to the transport; `None` when input is suspended.
    /// May be present but empty — an empty write is a no-op.
    pub(crate) forward: Option<Bytes>,
    /// Advisory precondition violations to report.
    pub(crate) advisories: Vec<RloginClientError>,
    /// An escape action requested disconnect.
    pub(crate) disconnect: bool,
}

/// The session object: single owner of all mutable protocol state.
pub(crate) struct Session {
    state: SessionState,
    terminal: Arc<Mutex<TerminalProperties>>,
    escapes: EscapeRegistry,
    /// Capability flag for the inbound control-byte scanner. Stays false
    /// until a transport can signal urgent data.
    control_scan: bool,
}

impl Session {
    pub(crate) fn new(terminal: Arc<Mutex<TerminalProperties>>, escapes: EscapeRegistry) -> Self {
        Self {
            state: SessionState::new(),
            terminal,
            escapes,
            control_scan: false,
        }
    }

    pub(crate) fn connected(&self) -> bool {
        self.state.connected
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub(crate) fn set_control_scan(&mut self, enabled: bool) {
        self.control_scan = enabled;
    }

    /// Process a chunk delivered by the transport.
    ///
    /// While not connected, the first byte resolves the handshake; any
    /// remainder of the same chunk is the first inbound data. Once
    /// connected, chunks run through the inbound filter.
    pub(crate) fn receive(&mut self, chunk: &[u8]) -> InboundOutcome {
        let mut outcome = InboundOutcome::default();

        let data = if self.state.connected {
            chunk
        } else {
            let Some((&first, rest)) = chunk.split_first() else {
                return outcome;
            };
            match HandshakeReply::from_byte(first) {
                HandshakeReply::Accepted => {
                    self.state.connected = true;
                    outcome.connection_result = Some(true);
                    if rest.is_empty() {
                        return outcome;
                    }
                    rest
                }
                HandshakeReply::Refused(_) => {
                    outcome.connection_result = Some(false);
                    outcome.disconnect = true;
                    return outcome;
                }
            }
        };

        let scan = filter::scan_inbound(&mut self.state, data, self.control_scan);
        outcome.deliver = scan.deliver;
        outcome.send_window_size = scan.send_window_size;
        outcome
    }

    /// Scan consumer input and produce the bytes to forward.
    ///
    /// Precondition violations (not connected, input suspended) are reported
    /// as advisories and never stop the scan; the escape and line-boundary
    /// flags must keep tracking the stream even while the result is
    /// discarded. The forward buffer is withheld when input is suspended
    /// *after* the scan, so an escape command suspending input discards the
    /// bytes of its own chunk.
    pub(crate) fn filter_input(&mut self, data: &[u8]) -> OutboundOutcome {
        let mut advisories = Vec::new();
        if !self.state.connected {
            advisories.push(RloginClientError::NotConnected);
        }
        if self.state.input_suspended {
            advisories.push(RloginClientError::InputSuspended);
        }

        let escape_byte = self.terminal.lock().escape_byte();
        let scan = filter::scan_outbound(&mut self.state, &mut self.escapes, escape_byte, data);

        let forward = if self.state.input_suspended {
            None
        } else {
            Some(scan.forward)
        };

        OutboundOutcome {
            forward,
            advisories,
            disconnect: scan.disconnect,
        }
    }

    /// Encode a window-change control sequence, or `None` while not
    /// connected.
    pub(crate) fn window_change(&self) -> Option<[u8; WCCS_LEN]> {
        self.state
            .connected
            .then(|| wccs::encode_window_change(self.terminal.lock().size()))
    }

    /// Bind an escape action.
    pub(crate) fn register_escape(
        &mut self,
        key: EscapeKey,
        mut action: EscapeAction,
    ) -> Result<(), RloginClientError> {
        self.escapes
            .register(key, move |ctx: &mut crate::escape::EscapeContext<'_>| {
                action(ctx)
            })
    }

    pub(crate) fn set_rows(&mut self, rows: u16) -> Result<(), RloginClientError> {
        self.terminal.lock().set_rows(rows)
    }

    pub(crate) fn set_columns(&mut self, columns: u16) -> Result<(), RloginClientError> {
        self.terminal.lock().set_columns(columns)
    }

    pub(crate) fn set_pixels_x(&mut self, pixels: u16) -> Result<(), RloginClientError> {
        self.terminal.lock().set_pixels_x(pixels)
    }

    pub(crate) fn set_pixels_y(&mut self, pixels: u16) -> Result<(), RloginClientError> {
        self.terminal.lock().set_pixels_y(pixels)
    }

    pub(crate) fn set_escape_char(&mut self, ch: char) -> Result<(), RloginClientError> {
        self.terminal.lock().set_escape_char(ch)
    }

    /// Record the end of the session.
    ///
    /// Returns true exactly once per established session, so the caller can
    /// emit a single disconnect notification; repeated calls (and calls on a
    /// session that never connected) return false.
    pub(crate) fn mark_disconnected(&mut self) -> bool {
        if !self.state.connected {
            return false;
        }
        self.state.connected = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            Arc::new(Mutex::new(TerminalProperties::default())),
            EscapeRegistry::with_defaults(),
        )
    }

    fn connect(session: &mut Session) {
        let outcome = session.receive(&[0]);
        assert_eq!(outcome.connection_result, Some(true));
    }

    #[test]
    fn test_zero_reply_connects_without_data() {
        let mut session = session();
        let outcome = session.receive(&[0]);
        assert_eq!(outcome.connection_result, Some(true));
        assert!(outcome.deliver.is_none());
        assert!(!outcome.disconnect);
        assert!(session.connected());
    }

    #[test]
    fn test_zero_reply_with_remainder_delivers_it() {
        let mut session = session();
        let outcome = session.receive(b"\0Welcome");
        assert_eq!(outcome.connection_result, Some(true));
        assert_eq!(outcome.deliver.as_deref(), Some(&b"Welcome"[..]));
    }

    #[test]
    fn test_nonzero_reply_fails_and_disconnects() {
        let mut session = session();
        let outcome = session.receive(b"\x01Permission denied.");
        assert_eq!(outcome.connection_result, Some(false));
        assert!(outcome.deliver.is_none());
        assert!(outcome.disconnect);
        assert!(!session.connected());
    }

    #[test]
    fn test_data_after_connect_passes_through() {
        let mut session = session();
        connect(&mut session);
        let outcome = session.receive(b"abc");
        assert_eq!(outcome.connection_result, None);
        assert_eq!(outcome.deliver.as_deref(), Some(&b"abc"[..]));
    }

    #[test]
    fn test_suspended_output_drops_inbound() {
        let mut session = session();
        connect(&mut session);
        session.state.output_suspended = true;
        let outcome = session.receive(b"dropped");
        assert!(outcome.deliver.is_none());
    }

    #[test]
    fn test_window_change_gated_on_connected() {
        let mut session = session();
        assert!(session.window_change().is_none());
        connect(&mut session);
        assert_eq!(
            session.window_change(),
            Some([0xFF, 0xFF, 0x73, 0x73, 0x18, 0x00, 0x50, 0x00, 0x80, 0x02, 0xE0, 0x01])
        );
    }

    #[test]
    fn test_mark_disconnected_is_idempotent() {
        let mut session = session();
        assert!(!session.mark_disconnected());
        connect(&mut session);
        assert!(session.mark_disconnected());
        assert!(!session.mark_disconnected());
        assert!(!session.connected());
    }

    #[test]
    fn test_filter_input_reports_advisories_but_scans() {
        let mut session = session();
        // Not connected: advisory, yet the scan runs and forwards
        let outcome = session.filter_input(b"hi");
        assert!(matches!(
            outcome.advisories.as_slice(),
            [RloginClientError::NotConnected]
        ));
        assert_eq!(outcome.forward.as_deref(), Some(&b"hi"[..]));
    }

    #[test]
    fn test_suspend_escape_discards_own_chunk() {
        let mut session = session();
        connect(&mut session);
        // SUB toggles input suspension on; the chunk's forward buffer is
        // discarded because the flag is checked after the scan
        let outcome = session.filter_input(&[b'~', 0x1A]);
        assert!(outcome.advisories.is_empty());
        assert!(outcome.forward.is_none());

        // While suspended: advisory, nothing forwarded
        let outcome = session.filter_input(b"abc");
        assert!(matches!(
            outcome.advisories.as_slice(),
            [RloginClientError::InputSuspended]
        ));
        assert!(outcome.forward.is_none());

        // Re-arm then toggle back off; forwarding resumes for later sends
        session.state.watching_for_escape = true;
        let outcome = session.filter_input(&[b'~', 0x1A]);
        assert!(matches!(
            outcome.advisories.as_slice(),
            [RloginClientError::InputSuspended]
        ));
        assert_eq!(outcome.forward.as_deref(), Some(&b""[..]));
        assert!(!session.state.input_suspended);
    }

    #[test]
    fn test_escape_disconnect_surfaces_in_outcome() {
        let mut session = session();
        connect(&mut session);
        let outcome = session.filter_input(b"~.");
        assert!(outcome.disconnect);
        assert_eq!(outcome.forward.as_deref(), Some(&b""[..]));
    }

    #[test]
    fn test_setters_validate() {
        let mut session = session();
        assert!(session.set_rows(0).is_err());
        assert_eq!(session.terminal.lock().rows(), 24);
        session.set_rows(50).unwrap();
        assert_eq!(session.terminal.lock().rows(), 50);

        assert!(session.set_columns(0).is_err());
        assert!(session.set_pixels_x(0).is_err());
        assert!(session.set_pixels_y(0).is_err());

        assert!(session.set_escape_char('\u{2192}').is_err());
        assert_eq!(session.terminal.lock().escape_char(), '~');
        session.set_escape_char('!').unwrap();
        assert_eq!(session.terminal.lock().escape_byte(), b'!');
    }

    #[test]
    fn test_changed_escape_char_drives_scanner() {
        let mut session = session();
        connect(&mut session);
        session.set_escape_char('!').unwrap();
        let outcome = session.filter_input(b"!.");
        assert!(outcome.disconnect);
        assert_eq!(outcome.forward.as_deref(), Some(&b""[..]));
    }

    #[test]
    fn test_register_escape_validates_key() {
        let mut session = session();
        let err = session
            .register_escape(EscapeKey::from("ab"), Box::new(|_| {}))
            .unwrap_err();
        assert!(matches!(err, RloginClientError::Registration(_)));
    }

    #[test]
    fn test_control_scan_window_request_triggers_wccs() {
        let mut session = session();
        connect(&mut session);
        session.set_control_scan(true);
        let outcome = session.receive(&[0x80, b'h', b'i']);
        assert!(outcome.send_window_size);
        assert_eq!(outcome.deliver.as_deref(), Some(&b"hi"[..]));
        // The scanner can also flip cooked mode
        session.receive(&[0x10]);
        assert!(!session.state.cooked);
    }

    #[test]
    fn test_empty_chunk_is_ignored() {
        let mut session = session();
        let outcome = session.receive(&[]);
        assert_eq!(outcome.connection_result, None);
        assert!(!session.connected());
    }
}
