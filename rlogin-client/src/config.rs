//! Configuration types for the rlogin client.

use crate::errors::RloginClientError;
use rlogin_common::WindowSize;
use rlogin_protocol::handshake::ConnectionRequest;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete rlogin client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Connection settings.
    pub connection: ConnectionConfig,
    /// Login settings sent in the connection request.
    pub login: LoginConfig,
    /// Terminal geometry and escape character.
    #[serde(default)]
    pub terminal: TerminalConfig,
}

/// Connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Server hostname or IP address.
    pub host: String,
    /// Server port (the rlogin well-known port is 513).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connection timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_port() -> u16 {
    513
}

fn default_timeout_ms() -> u64 {
    10_000
}

/// Login configuration: the four handshake fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginConfig {
    /// User name on the client machine.
    pub client_username: String,
    /// User name to log in as on the server.
    pub server_username: String,
    /// Terminal type advertised to the server.
    #[serde(default = "default_terminal_type")]
    pub terminal_type: String,
    /// Terminal speed in bits per second.
    #[serde(default = "default_terminal_speed")]
    pub terminal_speed: u32,
}

fn default_terminal_type() -> String {
    "xterm".to_string()
}

fn default_terminal_speed() -> u32 {
    9600
}

/// Terminal configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Terminal rows in character cells.
    #[serde(default = "default_rows")]
    pub rows: u16,
    /// Terminal columns in character cells.
    #[serde(default = "default_columns")]
    pub columns: u16,
    /// Terminal width in pixels.
    #[serde(default = "default_pixels_x")]
    pub pixels_x: u16,
    /// Terminal height in pixels.
    #[serde(default = "default_pixels_y")]
    pub pixels_y: u16,
    /// The client escape character; must denote a single byte.
    #[serde(default = "default_escape_char")]
    pub escape_char: char,
}

fn default_rows() -> u16 {
    24
}

fn default_columns() -> u16 {
    80
}

fn default_pixels_x() -> u16 {
    640
}

fn default_pixels_y() -> u16 {
    480
}

fn default_escape_char() -> char {
    '~'
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            columns: default_columns(),
            pixels_x: default_pixels_x(),
            pixels_y: default_pixels_y(),
            escape_char: default_escape_char(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig {
                host: String::new(),
                port: default_port(),
                timeout_ms: default_timeout_ms(),
            },
            login: LoginConfig {
                client_username: String::new(),
                server_username: String::new(),
                terminal_type: default_terminal_type(),
                terminal_speed: default_terminal_speed(),
            },
            terminal: TerminalConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parse a configuration from TOML text and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or the configuration is
    /// invalid.
    pub fn from_toml_str(text: &str) -> Result<Self, RloginClientError> {
        let config: Self = toml::from_str(text)
            .map_err(|e| RloginClientError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed,
    /// or the configuration is invalid.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, RloginClientError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            RloginClientError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), RloginClientError> {
        if self.connection.host.is_empty() {
            return Err(RloginClientError::Config("Host cannot be empty".to_string()));
        }

        if self.connection.port == 0 {
            return Err(RloginClientError::Config("Port cannot be 0".to_string()));
        }

        if self.login.client_username.is_empty() {
            return Err(RloginClientError::Config(
                "Client username cannot be empty".to_string(),
            ));
        }

        if self.login.server_username.is_empty() {
            return Err(RloginClientError::Config(
                "Server username cannot be empty".to_string(),
            ));
        }

        if self.login.terminal_type.is_empty() {
            return Err(RloginClientError::Config(
                "Terminal type cannot be empty".to_string(),
            ));
        }

        if self.login.terminal_speed == 0 {
            return Err(RloginClientError::Config(
                "Terminal speed cannot be 0".to_string(),
            ));
        }

        if !self.window_size().is_valid() {
            return Err(RloginClientError::Config(
                "Terminal dimensions must be positive".to_string(),
            ));
        }

        if u32::from(self.terminal.escape_char) > 0xFF {
            return Err(RloginClientError::Config(format!(
                "Escape character {:?} does not fit in one byte",
                self.terminal.escape_char
            )));
        }

        Ok(())
    }

    /// Returns the connection timeout duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.connection.timeout_ms)
    }

    pub(crate) fn connection_request(&self) -> ConnectionRequest {
        ConnectionRequest {
            client_username: self.login.client_username.clone(),
            server_username: self.login.server_username.clone(),
            terminal_type: self.login.terminal_type.clone(),
            terminal_speed: self.login.terminal_speed,
        }
    }

    pub(crate) fn window_size(&self) -> WindowSize {
        WindowSize::new(
            self.terminal.rows,
            self.terminal.columns,
            self.terminal.pixels_x,
            self.terminal.pixels_y,
        )
    }
}

/// Builder for creating a `Config`.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Sets the server hostname or IP address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.connection.host = host.into();
        self
    }

    /// Sets the server port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.connection.port = port;
        self
    }

    /// Sets the user name on the client machine.
    #[must_use]
    pub fn client_username(mut self, username: impl Into<String>) -> Self {
        self.config.login.client_username = username.into();
        self
    }

    /// Sets the user name to log in as on the server.
    #[must_use]
    pub fn server_username(mut self, username: impl Into<String>) -> Self {
        self.config.login.server_username = username.into();
        self
    }

    /// Sets the terminal type advertised to the server.
    #[must_use]
    pub fn terminal_type(mut self, terminal_type: impl Into<String>) -> Self {
        self.config.login.terminal_type = terminal_type.into();
        self
    }

    /// Sets the terminal speed in bits per second.
    #[must_use]
    pub fn terminal_speed(mut self, speed: u32) -> Self {
        self.config.login.terminal_speed = speed;
        self
    }

    /// Sets the client escape character.
    #[must_use]
    pub fn escape_char(mut self, ch: char) -> Self {
        self.config.terminal.escape_char = ch;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<Config, RloginClientError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ConfigBuilder {
        Config::builder()
            .host("localhost")
            .client_username("alice")
            .server_username("bob")
    }

    #[test]
    fn test_config_builder() {
        let config = builder().build().unwrap();
        assert_eq!(config.connection.host, "localhost");
        assert_eq!(config.connection.port, 513);
        assert_eq!(config.login.terminal_type, "xterm");
        assert_eq!(config.login.terminal_speed, 9600);
        assert_eq!(config.terminal.escape_char, '~');
    }

    #[test]
    fn test_config_validation_empty_host() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_port() {
        assert!(builder().port(0).build().is_err());
    }

    #[test]
    fn test_config_validation_empty_usernames() {
        assert!(builder().client_username("").build().is_err());
        assert!(builder().server_username("").build().is_err());
    }

    #[test]
    fn test_config_validation_zero_speed() {
        assert!(builder().terminal_speed(0).build().is_err());
    }

    #[test]
    fn test_config_validation_wide_escape_char() {
        assert!(builder().escape_char('\u{2192}').build().is_err());
    }

    #[test]
    fn test_config_validation_zero_geometry() {
        let mut config = builder().build().unwrap();
        config.terminal.rows = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connection_request_fields() {
        let config = builder().terminal_type("vt100").terminal_speed(19200).build().unwrap();
        let request = config.connection_request();
        assert_eq!(request.client_username, "alice");
        assert_eq!(request.server_username, "bob");
        assert_eq!(request.terminal_type, "vt100");
        assert_eq!(request.terminal_speed, 19200);
    }

    #[test]
    fn test_from_toml_str() {
        let config = Config::from_toml_str(
            r#"
            [connection]
            host = "bbs.example.net"

            [login]
            client_username = "alice"
            server_username = "bob"

            [terminal]
            rows = 50
            escape_char = "!"
            "#,
        )
        .unwrap();
        assert_eq!(config.connection.host, "bbs.example.net");
        assert_eq!(config.connection.port, 513);
        assert_eq!(config.terminal.rows, 50);
        assert_eq!(config.terminal.columns, 80);
        assert_eq!(config.terminal.escape_char, '!');
    }

    #[test]
    fn test_from_toml_str_rejects_invalid() {
        // Valid TOML, invalid configuration
        let result = Config::from_toml_str(
            r#"
            [connection]
            host = ""

            [login]
            client_username = "alice"
            server_username = "bob"
            "#,
        );
        assert!(result.is_err());
    }
}
