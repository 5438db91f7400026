//! leadstock entry point.
//!
//! `serve` runs the snapshot server; `watch` connects to one and renders
//! the dashboard in the terminal.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use leadstock_app::{render, AppConfig};
use leadstock_client::ConnectionManager;
use leadstock_feed::{NoDetailProvider, PlaceholderProducer};
use leadstock_server::run_server;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Live stock dashboard: snapshot server and terminal viewer.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via LEADSTOCK_CONFIG).
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the snapshot server.
    Serve,
    /// Watch a server and render the dashboard.
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    // TLS crypto provider must be installed before any WS connections.
    leadstock_client::init_crypto();

    let args = Args::parse();
    leadstock_app::init_logging();

    let config_path = args
        .config
        .or_else(|| std::env::var("LEADSTOCK_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());
    info!(config_path = %config_path, "Loading configuration");
    let config = AppConfig::from_file(&config_path)?;

    match args.command {
        Command::Serve => serve(config).await,
        Command::Watch => watch(config).await,
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    info!("Starting leadstock server v{}", env!("CARGO_PKG_VERSION"));

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            signal.cancel();
        }
    });

    run_server(
        Arc::new(PlaceholderProducer::default()),
        Arc::new(NoDetailProvider),
        config.server,
        shutdown,
    )
    .await?;
    Ok(())
}

async fn watch(config: AppConfig) -> Result<()> {
    info!(server_url = %config.client.server_url, "Starting dashboard");

    let handle = ConnectionManager::spawn(config.client);
    let mut view = handle.view();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                handle.shutdown();
                break;
            }
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = render(&view.borrow_and_update());
                // Clear screen, cursor home, draw.
                print!("\x1b[2J\x1b[H{frame}");
            }
        }
    }
    Ok(())
}
