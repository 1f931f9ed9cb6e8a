//! WhatsApp bridge console - main entry point.

use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wa_console::commands::{dispatch, registry};
use wa_console::config::Config;
use wa_console::error::AppResult;
use wa_console::session::Session;

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.console.log_level);

    info!("Starting WhatsApp bridge console...");

    let client = config.bridge_client()?;

    // Health check
    if client.health_check().await {
        info!("Bridge healthy at {}", client.base_url());
    } else {
        warn!(
            "Bridge not reachable at {} - commands will fail until it is",
            client.base_url()
        );
    }

    let session = Arc::new(Session::new(client, config.session_settings()));

    match session.devices().await.refresh().await {
        Ok(devices) => info!("Found {} device(s)", devices.len()),
        Err(e) => warn!("Could not list devices: {}", e),
    }
    if let Some(device) = session.devices().await.current_id() {
        info!("Using device {}", device);
    }

    let handlers = registry(session.clone());
    info!("Registered {} command handlers", handlers.len());
    println!("Type help for the list of commands.");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = LinesStream::new(stdin.lines());

    // Main command loop
    loop {
        tokio::select! {
            line = lines.next() => {
                match line {
                    Some(Ok(line)) => {
                        if let Some(output) = dispatch(&handlers, session.presenter(), &line).await {
                            println!("{}", output);
                        }
                    }
                    Some(Err(e)) => {
                        error!("Failed to read input: {}", e);
                        break;
                    }
                    None => {
                        info!("End of input");
                        break;
                    }
                }
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Shutting down...");
    session.shutdown().await;
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
