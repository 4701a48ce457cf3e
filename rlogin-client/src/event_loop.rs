//! Event loop coordination: transport reads, consumer commands, disconnect.
//!
//! A single spawned task owns the [`Session`] and both transport halves, so
//! every state transition happens in exactly one mutator context: either the
//! delivery of a transport chunk or the handling of a consumer command.

use crate::{
    config::Config,
    connection::{self, Connection},
    errors::RloginClientError,
    escape::EscapeRegistry,
    messages::{ClientCommand, SessionEvent},
    session::{Session, TerminalProperties},
};
use parking_lot::Mutex;
use rlogin_protocol::io::RloginOutStream;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::select;
use tokio::task::JoinHandle;

/// Spawn the client event loop.
///
/// Establishes the connection, writes the connection request, and starts the
/// select loop over transport chunks and consumer commands.
pub(crate) async fn spawn(
    config: Config,
    commands: flume::Receiver<ClientCommand>,
    events: flume::Sender<SessionEvent>,
    connected: Arc<AtomicBool>,
    terminal: Arc<Mutex<TerminalProperties>>,
) -> Result<JoinHandle<()>, RloginClientError> {
    let conn = connection::establish(&config).await?;
    let session = Session::new(terminal, EscapeRegistry::with_defaults());

    Ok(tokio::spawn(run(conn, session, commands, events, connected)))
}

async fn run(
    conn: Connection,
    mut session: Session,
    commands: flume::Receiver<ClientCommand>,
    events: flume::Sender<SessionEvent>,
    connected: Arc<AtomicBool>,
) {
    let Connection { mut input, mut output } = conn;

    loop {
        select! {
            chunk = input.read_chunk() => {
                let flow = match chunk {
                    Ok(Some(data)) => {
                        handle_chunk(&mut session, &mut output, &events, &connected, &data).await
                    }
                    Ok(None) => {
                        tracing::info!("Server closed the connection");
                        finish_disconnect(&mut session, &mut output, &events, &connected).await;
                        ControlFlow::Break(())
                    }
                    Err(e) => {
                        let _ = events.send(SessionEvent::Error {
                            message: format!("Transport read failed: {e}"),
                        });
                        finish_disconnect(&mut session, &mut output, &events, &connected).await;
                        ControlFlow::Break(())
                    }
                };
                if flow.is_break() {
                    break;
                }
            }

            cmd = commands.recv_async() => {
                let flow = match cmd {
                    Ok(command) => {
                        handle_command(&mut session, &mut output, &events, &connected, command).await
                    }
                    Err(_) => {
                        // Every handle has been dropped
                        finish_disconnect(&mut session, &mut output, &events, &connected).await;
                        ControlFlow::Break(())
                    }
                };
                if flow.is_break() {
                    break;
                }
            }
        }
    }
}

async fn handle_chunk(
    session: &mut Session,
    output: &mut RloginOutStream<OwnedWriteHalf>,
    events: &flume::Sender<SessionEvent>,
    connected: &Arc<AtomicBool>,
    data: &[u8],
) -> ControlFlow<()> {
    let outcome = session.receive(data);

    if let Some(success) = outcome.connection_result {
        connected.store(success, Ordering::SeqCst);
        if success {
            tracing::info!("Login accepted");
        } else {
            tracing::warn!("Login refused by server");
        }
        let _ = events.send(SessionEvent::ConnectionResult { success });
    }

    if outcome.send_window_size {
        send_window_size(session, output, events).await;
    }

    if let Some(payload) = outcome.deliver {
        if !payload.is_empty() {
            let _ = events.send(SessionEvent::Data { payload });
        }
    }

    if outcome.disconnect {
        finish_disconnect(session, output, events, connected).await;
        return ControlFlow::Break(());
    }
    ControlFlow::Continue(())
}

async fn handle_command(
    session: &mut Session,
    output: &mut RloginOutStream<OwnedWriteHalf>,
    events: &flume::Sender<SessionEvent>,
    connected: &Arc<AtomicBool>,
    command: ClientCommand,
) -> ControlFlow<()> {
    match command {
        ClientCommand::Send(data) => {
            let outcome = session.filter_input(&data);

            for advisory in outcome.advisories {
                tracing::warn!("{advisory}");
                let _ = events.send(SessionEvent::Error {
                    message: advisory.to_string(),
                });
            }

            if let Some(forward) = outcome.forward {
                if !forward.is_empty() {
                    output.write_bytes(&forward);
                    if let Err(e) = output.flush().await {
                        let _ = events.send(SessionEvent::Error {
                            message: format!("Transport write failed: {e}"),
                        });
                    }
                }
            }

            if outcome.disconnect {
                tracing::info!("Escape command requested disconnect");
                finish_disconnect(session, output, events, connected).await;
                return ControlFlow::Break(());
            }
        }

        ClientCommand::SendWindowSize => {
            send_window_size(session, output, events).await;
        }

        ClientCommand::SetRows(rows) => {
            report_advisory(events, session.set_rows(rows));
        }
        ClientCommand::SetColumns(columns) => {
            report_advisory(events, session.set_columns(columns));
        }
        ClientCommand::SetPixelsX(pixels) => {
            report_advisory(events, session.set_pixels_x(pixels));
        }
        ClientCommand::SetPixelsY(pixels) => {
            report_advisory(events, session.set_pixels_y(pixels));
        }
        ClientCommand::SetEscapeChar(ch) => {
            report_advisory(events, session.set_escape_char(ch));
        }

        ClientCommand::RegisterEscape { key, action } => {
            report_advisory(events, session.register_escape(key, action));
        }

        ClientCommand::Disconnect => {
            finish_disconnect(session, output, events, connected).await;
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

/// Write a window-change control sequence if the session is connected.
async fn send_window_size(
    session: &mut Session,
    output: &mut RloginOutStream<OwnedWriteHalf>,
    events: &flume::Sender<SessionEvent>,
) {
    let Some(sequence) = session.window_change() else {
        return;
    };
    output.write_bytes(&sequence);
    if let Err(e) = output.flush().await {
        let _ = events.send(SessionEvent::Error {
            message: format!("Transport write failed: {e}"),
        });
    } else {
        tracing::debug!("Sent window-change control sequence");
    }
}

/// Close the transport and emit at most one `Disconnected` event.
async fn finish_disconnect(
    session: &mut Session,
    output: &mut RloginOutStream<OwnedWriteHalf>,
    events: &flume::Sender<SessionEvent>,
    connected: &Arc<AtomicBool>,
) {
    if let Err(e) = output.shutdown().await {
        tracing::debug!("Transport shutdown after disconnect: {e}");
    }
    if session.mark_disconnected() {
        connected.store(false, Ordering::SeqCst);
        let _ = events.send(SessionEvent::Disconnected);
    }
}

fn report_advisory(events: &flume::Sender<SessionEvent>, result: Result<(), RloginClientError>) {
    if let Err(e) = result {
        tracing::warn!("{e}");
        let _ = events.send(SessionEvent::Error {
            message: e.to_string(),
        });
    }
}
