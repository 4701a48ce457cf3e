//! Connection establishment.
//!
//! Connects the transport and sends the connection request. The server's
//! reply byte is *not* awaited here: it arrives with (or ahead of) the first
//! session data and is resolved by the session state machine inside the
//! event loop, exactly as the protocol allows.

use crate::{config::Config, errors::RloginClientError, transport::Transport};
use rlogin_protocol::handshake;
use rlogin_protocol::io::{RloginInStream, RloginOutStream};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

/// An established transport with the connection request already on the wire.
pub(crate) struct Connection {
    pub(crate) input: RloginInStream<OwnedReadHalf>,
    pub(crate) output: RloginOutStream<OwnedWriteHalf>,
}

/// Establish a new rlogin connection using the given configuration.
///
/// Steps:
/// 1) Connect the TCP transport (bounded by the configured timeout)
/// 2) Split into buffered input/output streams
/// 3) Write the connection request
pub(crate) async fn establish(config: &Config) -> Result<Connection, RloginClientError> {
    let host = &config.connection.host;
    let port = config.connection.port;

    let transport = tokio::time::timeout(config.timeout(), Transport::connect(host, port))
        .await
        .map_err(|_| {
            RloginClientError::ConnectionFailed(format!(
                "Connection to {}:{} timed out after {:?}",
                host,
                port,
                config.timeout()
            ))
        })??;

    let (input, mut output) = transport.split();

    let request = config.connection_request();
    handshake::write_connection_request(&mut output, &request).await?;
    tracing::debug!(
        "Sent connection request for {} as {}",
        request.client_username,
        request.server_username
    );

    Ok(Connection { input, output })
}
