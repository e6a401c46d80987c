//! Climate Server
//!
//! Room comfort service with REST and WebSocket API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use climate::config::AppConfig;
use climate::server::{AppState, create_router};
use climate::store::{ClimateStore, MemoryStore, RedbStore};

/// Climate Room Comfort Server
#[derive(Parser, Debug)]
#[command(name = "climate")]
#[command(about = "Room climate comfort server", long_about = None)]
struct Args {
    /// Path to the config file (defaults to ./climate.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host address
    #[arg(long)]
    host: Option<String>,

    /// Server port
    #[arg(long)]
    port: Option<u16>,

    /// Path to the database file
    #[arg(long)]
    db: Option<PathBuf>,

    /// Keep rooms and readings in memory only
    #[arg(long)]
    in_memory: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(db) = &self.db {
            config.storage.db_path = db.clone();
        }
        if self.in_memory {
            config.storage.in_memory = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    init_tracing(&config);

    info!("Starting climate server v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn ClimateStore> = if config.storage.in_memory {
        info!("Using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        info!("Opening database {}", config.storage.db_path.display());
        Arc::new(RedbStore::open(&config.storage.db_path)?)
    };

    // Create application state
    let state = AppState::new(store, Duration::from_secs(config.cache.ttl_secs));

    // Create router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = config.bind_address().parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins over the configured filter
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.filter));

    let registry = tracing_subscriber::registry().with(filter);
    if config.log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down...");
        },
    }
}
