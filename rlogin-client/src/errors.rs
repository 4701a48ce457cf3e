//! Error types for the rlogin client.

use std::io;
use thiserror::Error;

/// Errors that can occur during rlogin client operation.
#[derive(Debug, Error)]
pub enum RloginClientError {
    /// Transport-level error (TCP, socket operations).
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// Connection failed (TCP connection establishment failed or timed out).
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Configuration error (invalid connection arguments or terminal
    /// properties).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data was submitted for sending before the handshake completed.
    #[error("Send attempted while not connected")]
    NotConnected,

    /// Data was submitted for sending while input is suspended.
    #[error("Send attempted while input is suspended")]
    InputSuspended,

    /// Malformed arguments to escape registration.
    #[error("Escape registration rejected: {0}")]
    Registration(String),

    /// Connection has been closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Internal error (should not happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RloginClientError {
    /// Returns true if this error is advisory.
    ///
    /// Advisory errors are surfaced to the consumer as error notifications
    /// while the session carries on; the consumer alone decides whether to
    /// treat them as fatal. Non-advisory errors end the session (or prevent
    /// it from starting).
    #[must_use]
    pub fn is_advisory(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::Config(_)
                | Self::NotConnected
                | Self::InputSuspended
                | Self::Registration(_)
        )
    }

    /// Returns true if this error ends the session.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !self.is_advisory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categorization() {
        assert!(RloginClientError::Transport(io::Error::from(io::ErrorKind::BrokenPipe))
            .is_advisory());
        assert!(RloginClientError::NotConnected.is_advisory());
        assert!(RloginClientError::InputSuspended.is_advisory());
        assert!(RloginClientError::Registration("too long".to_string()).is_advisory());
        assert!(RloginClientError::Config("rows".to_string()).is_advisory());

        assert!(RloginClientError::ConnectionFailed("refused".to_string()).is_fatal());
        assert!(RloginClientError::ConnectionClosed.is_fatal());
        assert!(RloginClientError::Internal("oops".to_string()).is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = RloginClientError::Config("Invalid 'rows' setting 0".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid 'rows' setting 0");

        assert_eq!(
            RloginClientError::InputSuspended.to_string(),
            "Send attempted while input is suspended"
        );
    }
}
