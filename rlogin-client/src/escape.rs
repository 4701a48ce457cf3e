//! Client escape sequences and their action registry.
//!
//! When the escape character (default `~`) appears at a recognized
//! line-start position in the consumer's input, the byte that follows it is
//! looked up here and interpreted as a local command instead of being
//! forwarded to the server. RFC 1282 suggests the default bindings:
//! `.` and EOT disconnect, SUB suspends both directions, EOM suspends input
//! only.
//!
//! Consumers can bind their own actions (or override the defaults) through
//! [`ClientHandle::register_escape`](crate::ClientHandle::register_escape):
//!
//! ```no_run
//! # fn example(handle: &rlogin_client::ClientHandle) {
//! handle
//!     .register_escape('s', |ctx| {
//!         let suspended = !ctx.input_suspended();
//!         ctx.suspend_input(suspended);
//!     })
//!     .unwrap();
//! # }
//! ```

use crate::errors::RloginClientError;
use crate::session::SessionState;
use rlogin_protocol::control;
use std::collections::HashMap;
use std::fmt;

/// The view of the session an escape action is allowed to manipulate.
///
/// Actions run synchronously inside the outbound scan. They can read and
/// flip the suspension flags and request a disconnect; the disconnect is
/// carried out right after the scan finishes, so an action can never
/// re-enter the scanner.
pub struct EscapeContext<'a> {
    state: &'a mut SessionState,
    disconnect: bool,
}

impl<'a> EscapeContext<'a> {
    pub(crate) fn new(state: &'a mut SessionState) -> Self {
        Self {
            state,
            disconnect: false,
        }
    }

    /// Whether forwarding of consumer input is currently suspended.
    #[must_use]
    pub fn input_suspended(&self) -> bool {
        self.state.input_suspended
    }

    /// Whether delivery of server output is currently suspended.
    #[must_use]
    pub fn output_suspended(&self) -> bool {
        self.state.output_suspended
    }

    /// Suspend or resume forwarding of consumer input.
    pub fn suspend_input(&mut self, suspended: bool) {
        self.state.input_suspended = suspended;
    }

    /// Suspend or resume delivery of server output.
    pub fn suspend_output(&mut self, suspended: bool) {
        self.state.output_suspended = suspended;
    }

    /// Request a disconnect once the current scan completes.
    pub fn disconnect(&mut self) {
        self.disconnect = true;
    }

    pub(crate) fn disconnect_requested(&self) -> bool {
        self.disconnect
    }
}

/// A zero-argument escape action.
pub type EscapeAction = Box<dyn FnMut(&mut EscapeContext<'_>) + Send>;

/// An escape binding key: a byte, or a character denoting one.
///
/// Characters (and one-character strings) must denote a single byte, i.e.
/// fall at or below U+00FF; anything else is rejected at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscapeKey {
    /// A byte value, bound directly.
    Byte(u8),
    /// A character; must be at or below U+00FF.
    Char(char),
    /// A string; must contain exactly one character at or below U+00FF.
    Text(String),
}

impl From<u8> for EscapeKey {
    fn from(byte: u8) -> Self {
        Self::Byte(byte)
    }
}

impl From<char> for EscapeKey {
    fn from(ch: char) -> Self {
        Self::Char(ch)
    }
}

impl From<&str> for EscapeKey {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl EscapeKey {
    /// Resolve the key to the byte it binds.
    ///
    /// # Errors
    ///
    /// Returns a [`RloginClientError::Registration`] error if the key does
    /// not denote exactly one byte.
    pub fn to_byte(&self) -> Result<u8, RloginClientError> {
        match self {
            Self::Byte(byte) => Ok(*byte),
            Self::Char(ch) => char_to_byte(*ch),
            Self::Text(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => char_to_byte(ch),
                    _ => Err(RloginClientError::Registration(format!(
                        "key {text:?} must be exactly one character"
                    ))),
                }
            }
        }
    }
}

fn char_to_byte(ch: char) -> Result<u8, RloginClientError> {
    u8::try_from(u32::from(ch)).map_err(|_| {
        RloginClientError::Registration(format!("character {ch:?} does not fit in one byte"))
    })
}

/// Mapping from byte values to escape actions.
///
/// Later registrations overwrite earlier ones, including the protocol
/// defaults.
pub struct EscapeRegistry {
    bindings: HashMap<u8, EscapeAction>,
}

impl Default for EscapeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for EscapeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<u8> = self.bindings.keys().copied().collect();
        keys.sort_unstable();
        f.debug_struct("EscapeRegistry").field("bound", &keys).finish()
    }
}

impl EscapeRegistry {
    /// Create a registry with no bindings.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Create a registry with the RFC 1282 default bindings.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.bind(control::DOT, |ctx| ctx.disconnect());
        registry.bind(control::EOT, |ctx| ctx.disconnect());
        registry.bind(control::SUB, |ctx| {
            let suspended = !ctx.input_suspended();
            ctx.suspend_input(suspended);
            ctx.suspend_output(suspended);
        });
        registry.bind(control::EOM, |ctx| {
            let suspended = !ctx.input_suspended();
            ctx.suspend_input(suspended);
            ctx.suspend_output(false);
        });
        registry
    }

    /// Install a binding for a byte key, which cannot fail.
    fn bind<F>(&mut self, byte: u8, action: F)
    where
        F: FnMut(&mut EscapeContext<'_>) + Send + 'static,
    {
        self.bindings.insert(byte, Box::new(action));
    }

    /// Install a binding, overwriting any existing one for the same byte.
    ///
    /// # Errors
    ///
    /// Returns a [`RloginClientError::Registration`] error if the key does
    /// not denote exactly one byte.
    pub fn register<K, F>(&mut self, key: K, action: F) -> Result<(), RloginClientError>
    where
        K: Into<EscapeKey>,
        F: FnMut(&mut EscapeContext<'_>) + Send + 'static,
    {
        let byte = key.into().to_byte()?;
        self.bindings.insert(byte, Box::new(action));
        Ok(())
    }

    /// Whether an action is bound for the given byte.
    #[must_use]
    pub fn is_bound(&self, byte: u8) -> bool {
        self.bindings.contains_key(&byte)
    }

    /// Run the action bound to `byte`, if any. Returns whether one ran.
    pub(crate) fn invoke(&mut self, byte: u8, ctx: &mut EscapeContext<'_>) -> bool {
        match self.bindings.get_mut(&byte) {
            Some(action) => {
                action(ctx);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_bound() {
        let registry = EscapeRegistry::with_defaults();
        for byte in [control::DOT, control::EOT, control::SUB, control::EOM] {
            assert!(registry.is_bound(byte), "byte {byte:#04x}");
        }
        assert!(!registry.is_bound(b'q'));
    }

    #[test]
    fn test_key_forms_resolve_to_same_byte() {
        assert_eq!(EscapeKey::from(0x2E).to_byte().unwrap(), 0x2E);
        assert_eq!(EscapeKey::from('.').to_byte().unwrap(), 0x2E);
        assert_eq!(EscapeKey::from(".").to_byte().unwrap(), 0x2E);
    }

    #[test]
    fn test_rejects_multi_character_key() {
        assert!(EscapeKey::from("ab").to_byte().is_err());
        assert!(EscapeKey::from("").to_byte().is_err());
    }

    #[test]
    fn test_rejects_wide_character_key() {
        assert!(EscapeKey::from('\u{2192}').to_byte().is_err());
        assert!(EscapeKey::from("\u{2192}").to_byte().is_err());
        // Latin-1 range still fits in a byte
        assert_eq!(EscapeKey::from('\u{e9}').to_byte().unwrap(), 0xE9);
    }

    #[test]
    fn test_register_overwrites_default() {
        let mut registry = EscapeRegistry::with_defaults();
        registry.register('.', |_ctx: &mut EscapeContext<'_>| {}).unwrap();

        let mut state = SessionState::new();
        state.connected = true;
        let mut ctx = EscapeContext::new(&mut state);
        assert!(registry.invoke(control::DOT, &mut ctx));
        // The replacement action does not disconnect
        assert!(!ctx.disconnect_requested());
    }

    #[test]
    fn test_invoke_unbound_returns_false() {
        let mut registry = EscapeRegistry::empty();
        let mut state = SessionState::new();
        let mut ctx = EscapeContext::new(&mut state);
        assert!(!registry.invoke(b'x', &mut ctx));
    }

    #[test]
    fn test_default_sub_suspends_both_directions() {
        let mut registry = EscapeRegistry::with_defaults();
        let mut state = SessionState::new();

        let mut ctx = EscapeContext::new(&mut state);
        registry.invoke(control::SUB, &mut ctx);
        assert!(state.input_suspended);
        assert!(state.output_suspended);

        let mut ctx = EscapeContext::new(&mut state);
        registry.invoke(control::SUB, &mut ctx);
        assert!(!state.input_suspended);
        assert!(!state.output_suspended);
    }

    #[test]
    fn test_default_eom_toggles_input_and_clears_output() {
        let mut registry = EscapeRegistry::with_defaults();
        let mut state = SessionState::new();
        state.output_suspended = true;

        let mut ctx = EscapeContext::new(&mut state);
        registry.invoke(control::EOM, &mut ctx);
        assert!(state.input_suspended);
        assert!(!state.output_suspended);
    }

    #[test]
    fn test_disconnect_defaults_request_disconnect() {
        let mut registry = EscapeRegistry::with_defaults();
        let mut state = SessionState::new();

        for byte in [control::DOT, control::EOT] {
            let mut ctx = EscapeContext::new(&mut state);
            registry.invoke(byte, &mut ctx);
            assert!(ctx.disconnect_requested(), "byte {byte:#04x}");
        }
    }
}
