//! Interactive rlogin client example - connect and relay the terminal.
//!
//! Usage:
//!   cargo run --example interactive -- <host>[:port] <client-user> <server-user>
//!
//! This example demonstrates:
//! - Creating a client configuration
//! - Connecting to an rlogin server
//! - Relaying stdin lines to the session
//! - Processing session events
//! - Escape sequences (type `~.` at a line start to disconnect)

use rlogin_client::{ClientBuilder, Config, SessionEvent};
use std::env;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <host>[:port] <client-user> <server-user>", args[0]);
        eprintln!("Example: {} bbs.example.net alice alice", args[0]);
        std::process::exit(1);
    }

    let (host, port) = parse_server_address(&args[1])?;
    let terminal_type = env::var("TERM").unwrap_or_else(|_| "xterm".to_string());

    info!("Connecting to {}:{} as {}", host, port, args[3]);

    // Create configuration
    let config = Config::builder()
        .host(&host)
        .port(port)
        .client_username(&args[2])
        .server_username(&args[3])
        .terminal_type(terminal_type)
        .build()?;

    // Build and connect client
    let client = match ClientBuilder::new(config).build().await {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to connect: {}", e);
            return Err(e.into());
        }
    };

    let handle = client.handle();

    // Relay stdin lines into the session
    let input_handle = handle.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let mut data = line.into_bytes();
            data.extend_from_slice(b"\r\n");
            if input_handle.send(data).is_err() {
                break;
            }
        }
    });

    // Process events
    let mut stdout = tokio::io::stdout();
    while let Ok(event) = handle.events().recv_async().await {
        match event {
            SessionEvent::ConnectionResult { success: true } => {
                info!("✓ Logged in ({}x{})", handle.columns(), handle.rows());
                handle.send_window_size()?;
            }
            SessionEvent::ConnectionResult { success: false } => {
                error!("Login refused by server");
            }
            SessionEvent::Data { payload } => {
                stdout.write_all(&payload).await?;
                stdout.flush().await?;
            }
            SessionEvent::Error { message } => {
                error!("Session error: {}", message);
            }
            SessionEvent::Disconnected => {
                info!("Connection closed");
                break;
            }
        }
    }

    Ok(())
}

fn parse_server_address(server: &str) -> anyhow::Result<(String, u16)> {
    if let Some((host, port_str)) = server.split_once(':') {
        let port = port_str.parse::<u16>()?;
        Ok((host.to_string(), port))
    } else {
        // Default rlogin port
        Ok((server.to_string(), 513))
    }
}
