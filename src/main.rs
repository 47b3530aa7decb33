//! Sluice file server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (Axum + tower layers)
//!                         │
//!                         ▼
//!                     middleware::root
//!                         │ pre-process (may short-circuit)
//!                         ▼
//!                     general middleware chain (request id, logging, metrics)
//!                         │
//!                         ▼
//!                     files::server ──▶ files::io ──▶ blocking pool ──▶ disk
//!                         │
//!                         ▼
//!                     post-process (headers, date)
//!     Client Response
//!     ◀──────────────  buffer or chunked stream
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use sluice::config::{load_config, AppConfig};
use sluice::lifecycle::{wait_for_signal, Shutdown};
use sluice::observability::{logging::init_logging, metrics::init_metrics};
use sluice::Application;

#[derive(Parser)]
#[command(name = "sluice")]
#[command(about = "Static file server with a composable middleware pipeline", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override `files.root`.
    #[arg(short, long)]
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(root) = args.root {
        config.files.root = root;
    }

    init_logging(&config.observability)?;
    tracing::info!("sluice v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        init_metrics(addr)?;
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        root = %config.files.root.display(),
        chunk_size = config.files.chunk_size,
        max_blocking_ops = config.files.max_blocking_ops,
        allow_uploads = config.files.allow_uploads,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let app = Application::new(config);
    let files = app.file_server();
    let server = app.into_server(files);

    let shutdown = Shutdown::new();
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => {
            result??;
            tracing::warn!("Server exited before a shutdown signal");
            return Ok(());
        }
        _ = wait_for_signal() => {}
    }

    shutdown.trigger();
    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}
