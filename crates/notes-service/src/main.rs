//! Multi-tenant note-keeping service
//!
//! Provides:
//! - Registration and password login issuing opaque `Bearer` tokens
//! - Owner-scoped note CRUD
//! - Substring search over the caller's own notes

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use notes_core::{LocalStore, NotesService};
use notes_service::{AppState, config::Config, router};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "notes-service")]
#[command(about = "Private, token-authenticated note collections over HTTP")]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 8000, env = "NOTES_PORT")]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0", env = "NOTES_BIND")]
    bind: String,

    /// Directory holding config.json and the note store
    #[arg(long, default_value = "./data", env = "NOTES_DATA_PATH")]
    data_path: PathBuf,

    /// Keep all state in memory (nothing is written to the data directory
    /// except the default config)
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notes_service=info,notes_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.data_path)?;
    let store = if cli.in_memory {
        tracing::info!("Using in-memory store");
        LocalStore::in_memory()
    } else {
        LocalStore::open(&cli.data_path)
            .with_context(|| format!("Failed to open store in {:?}", cli.data_path))?
    };
    let service = NotesService::with_local_store(Arc::new(store), &config.notes)
        .context("Failed to initialize notes service")?;

    let app = router(AppState::new(service));

    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;
    tracing::info!("Starting notes-service on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Notes service shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
