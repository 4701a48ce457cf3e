//! High-level async rlogin client library.
//!
//! This crate provides a complete rlogin (RFC 1282) client built on top of
//! the low-level `rlogin-protocol` crate. It handles connection
//! establishment, the login handshake, bidirectional terminal traffic
//! relay, client-side escape sequences, flow control, and window size
//! reporting.
//!
//! # Features
//!
//! - **Async I/O**: built on tokio for event-driven networking
//! - **Escape sequences**: RFC 1282 defaults plus consumer-defined actions
//! - **Flow control**: DC1/DC3 interception in cooked mode
//! - **Window size reporting**: the 12-byte window-change control sequence
//! - **Configuration management**: builder API and TOML files
//! - **Fail-fast policy**: clear error messages, no defensive fallbacks
//!
//! # Quick Start
//!
//! ```no_run
//! use rlogin_client::{ClientBuilder, Config, SessionEvent};
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Create configuration
//!     let config = Config::builder()
//!         .host("localhost")
//!         .port(513)
//!         .client_username("alice")
//!         .server_username("bob")
//!         .build()?;
//!
//!     // Build and connect client
//!     let client = ClientBuilder::new(config).build().await?;
//!     let handle = client.handle();
//!
//!     // Process session events
//!     while let Ok(event) = handle.events().recv_async().await {
//!         match event {
//!             SessionEvent::ConnectionResult { success } => {
//!                 println!("login accepted: {success}");
//!             }
//!             SessionEvent::Data { payload } => {
//!                 print!("{}", String::from_utf8_lossy(&payload));
//!             }
//!             SessionEvent::Disconnected => break,
//!             SessionEvent::Error { message } => eprintln!("{message}"),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! A single spawned task owns the session state and both transport halves,
//! selecting over transport chunks and consumer commands. The application
//! talks to it through a [`ClientHandle`]: commands go in over a bounded
//! channel, [`SessionEvent`]s come back out. Because one task is the only
//! mutator, the protocol state machine needs no locking; the handle's read
//! accessors use small shared mirrors.
//!
//! # Error Handling
//!
//! This crate follows a **fail-fast policy** for fatal conditions (bad
//! configuration, connection failure) and the rlogin tradition of advisory
//! reporting for everything else: precondition violations, rejected
//! property values, and transport write hiccups arrive as
//! [`SessionEvent::Error`] notifications while the session carries on. The
//! consumer alone decides whether an advisory error is fatal.
//!
//! # Safety
//!
//! This crate is `#![forbid(unsafe_code)]` and uses only safe Rust.

#![forbid(unsafe_code)]
#![deny(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::cargo
)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// Public modules
pub mod config;
pub mod errors;
pub mod escape;
pub mod messages;
pub mod transport;

// Private implementation modules
mod connection;
mod event_loop;
mod filter;
mod session;

// Re-exports
pub use config::Config;
pub use errors::RloginClientError;
pub use escape::{EscapeContext, EscapeKey};
pub use messages::{ClientCommand, SessionEvent};

use crate::session::TerminalProperties;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Builder for creating an rlogin client.
///
/// # Examples
///
/// ```no_run
/// use rlogin_client::{Config, ClientBuilder};
/// # use anyhow::Result;
///
/// # async fn example() -> Result<()> {
/// let config = Config::builder()
///     .host("localhost")
///     .client_username("alice")
///     .server_username("bob")
///     .build()?;
///
/// let client = ClientBuilder::new(config).build().await?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    config: Config,
}

impl ClientBuilder {
    /// Creates a new client builder with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Builds and connects the client.
    ///
    /// This connects the transport and writes the connection request. The
    /// server's reply arrives asynchronously as the first
    /// [`SessionEvent::ConnectionResult`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - Connection to the server fails or times out
    /// - Writing the connection request fails
    pub async fn build(self) -> Result<Client, RloginClientError> {
        // Validate configuration
        self.config.validate()?;

        let terminal = Arc::new(Mutex::new(TerminalProperties::from_config(
            &self.config.terminal,
        )?));
        let connected = Arc::new(AtomicBool::new(false));

        // Create channels for communication
        let (cmd_tx, cmd_rx) = flume::bounded(32);
        let (event_tx, event_rx) = flume::bounded(64);

        // Spawn event loop
        let join_handle = event_loop::spawn(
            self.config,
            cmd_rx,
            event_tx,
            connected.clone(),
            terminal.clone(),
        )
        .await?;

        Ok(Client {
            handle: ClientHandle {
                commands: cmd_tx,
                events: event_rx,
                connected,
                terminal,
            },
            join_handle,
        })
    }
}

/// Handle for interacting with a running rlogin client.
///
/// This handle allows sending data and commands to the session and
/// receiving events. It can be cloned and shared across threads.
#[derive(Clone)]
pub struct ClientHandle {
    commands: flume::Sender<ClientCommand>,
    events: flume::Receiver<SessionEvent>,
    connected: Arc<AtomicBool>,
    terminal: Arc<Mutex<TerminalProperties>>,
}

impl ClientHandle {
    /// Sends bytes to the server, subject to outbound filtering.
    ///
    /// The submission itself always succeeds while the client is running;
    /// precondition violations (not connected, input suspended) are
    /// reported as advisory [`SessionEvent::Error`] notifications, matching
    /// the protocol's advisory error model.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has shut down.
    pub fn send(&self, data: impl Into<Bytes>) -> Result<(), RloginClientError> {
        self.command(ClientCommand::Send(data.into()))
    }

    /// Sends a window-change control sequence.
    ///
    /// A no-op while not connected.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has shut down.
    pub fn send_window_size(&self) -> Result<(), RloginClientError> {
        self.command(ClientCommand::SendWindowSize)
    }

    /// Binds an escape action, replacing any existing binding for the key
    /// (defaults included).
    ///
    /// The key may be a byte, a `char`, or a one-character string slice.
    /// Malformed keys are reported as advisory [`SessionEvent::Error`]
    /// notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has shut down.
    pub fn register_escape<K, F>(&self, key: K, action: F) -> Result<(), RloginClientError>
    where
        K: Into<EscapeKey>,
        F: FnMut(&mut EscapeContext<'_>) + Send + 'static,
    {
        self.command(ClientCommand::RegisterEscape {
            key: key.into(),
            action: Box::new(action),
        })
    }

    /// Updates the terminal row count; rejected values are reported as
    /// advisory error notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has shut down.
    pub fn set_rows(&self, rows: u16) -> Result<(), RloginClientError> {
        self.command(ClientCommand::SetRows(rows))
    }

    /// Updates the terminal column count; rejected values are reported as
    /// advisory error notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has shut down.
    pub fn set_columns(&self, columns: u16) -> Result<(), RloginClientError> {
        self.command(ClientCommand::SetColumns(columns))
    }

    /// Updates the terminal width in pixels; rejected values are reported
    /// as advisory error notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has shut down.
    pub fn set_pixels_x(&self, pixels: u16) -> Result<(), RloginClientError> {
        self.command(ClientCommand::SetPixelsX(pixels))
    }

    /// Updates the terminal height in pixels; rejected values are reported
    /// as advisory error notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has shut down.
    pub fn set_pixels_y(&self, pixels: u16) -> Result<(), RloginClientError> {
        self.command(ClientCommand::SetPixelsY(pixels))
    }

    /// Changes the escape character; rejected values are reported as
    /// advisory error notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has shut down.
    pub fn set_escape_char(&self, ch: char) -> Result<(), RloginClientError> {
        self.command(ClientCommand::SetEscapeChar(ch))
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has already shut down.
    pub fn disconnect(&self) -> Result<(), RloginClientError> {
        self.command(ClientCommand::Disconnect)
    }

    /// Returns a reference to the event receiver.
    ///
    /// Events can be received using `recv()`, `recv_async()`, `try_recv()`,
    /// or by iterating over the receiver.
    #[must_use]
    pub fn events(&self) -> &flume::Receiver<SessionEvent> {
        &self.events
    }

    /// Whether the login handshake has completed and the session is alive.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// The current terminal row count.
    #[must_use]
    pub fn rows(&self) -> u16 {
        self.terminal.lock().rows()
    }

    /// The current terminal column count.
    #[must_use]
    pub fn columns(&self) -> u16 {
        self.terminal.lock().columns()
    }

    /// The current terminal width in pixels.
    #[must_use]
    pub fn pixels_x(&self) -> u16 {
        self.terminal.lock().pixels_x()
    }

    /// The current terminal height in pixels.
    #[must_use]
    pub fn pixels_y(&self) -> u16 {
        self.terminal.lock().pixels_y()
    }

    /// The current escape character.
    #[must_use]
    pub fn escape_char(&self) -> char {
        self.terminal.lock().escape_char()
    }

    fn command(&self, command: ClientCommand) -> Result<(), RloginClientError> {
        self.commands
            .send(command)
            .map_err(|_| RloginClientError::ConnectionClosed)
    }
}

/// A connected rlogin client.
///
/// The client runs its event loop in a background task. Use the `handle()`
/// method to get a handle for sending data and receiving events.
///
/// Dropping the client requests a disconnect; use `join()` to wait for the
/// session to end on its own.
pub struct Client {
    handle: ClientHandle,
    join_handle: JoinHandle<()>,
}

impl Client {
    /// Returns a handle for interacting with the client.
    ///
    /// The handle can be cloned and used from multiple threads.
    #[must_use]
    pub fn handle(&self) -> ClientHandle {
        self.handle.clone()
    }

    /// Waits for the session to end.
    ///
    /// This consumes the client and completes once the event loop task has
    /// finished (server close, escape disconnect, or an explicit
    /// [`ClientHandle::disconnect`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the background task panicked.
    pub async fn join(mut self) -> Result<(), RloginClientError> {
        // Take ownership of join_handle without triggering Drop
        let join_handle = std::mem::replace(&mut self.join_handle, tokio::spawn(async {}));
        // Prevent Drop from requesting disconnect
        std::mem::forget(self);
        join_handle
            .await
            .map_err(|e| RloginClientError::Internal(format!("Client task panicked: {e}")))
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // try_send: Drop must not block on a full command queue
        let _ = self.handle.commands.try_send(ClientCommand::Disconnect);
    }
}
