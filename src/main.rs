//! Parley Server
//!
//! Real-time chat relay: rooms, presence and typing events over WebSocket,
//! with SQLite-backed message history.
//!
//! # Configuration
//!
//! Settings come from a TOML config file (see `--generate-config`) with
//! environment variable overrides:
//! - `PARLEY_HOST`: Host to bind to (default: 0.0.0.0)
//! - `PARLEY_PORT`: Port to listen on (default: 8080)
//! - `PARLEY_DATABASE_PATH`: SQLite database file
//! - `PARLEY_AUTH_SECRET`: Token signing secret
//! - `PARLEY_LOG_LEVEL` / `PARLEY_LOG_FORMAT`: Logging
//! - `RUST_LOG`: Overrides the log filter entirely when set

use clap::Parser;
use parley::api::{serve, ApiConfig, AppState};
use parley::config::{generate_default_config, Config};
use parley::store::SqliteStore;
use parley::websocket::HubConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "parley")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real-time chat relay server")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database path (overrides config)
    #[arg(long)]
    database: Option<String>,

    /// Print a default config file and exit
    #[arg(long)]
    generate_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.generate_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(database) = cli.database {
        config.database.path = database;
    }

    init_tracing(&config);

    tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Database: {}", config.database.path);

    let store = Arc::new(SqliteStore::open(&config.database.path)?);

    let api_config = ApiConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        auth_secret: config.auth.secret.clone(),
        token_ttl_hours: config.auth.token_ttl_hours,
        ..Default::default()
    };
    let hub_config = HubConfig {
        session_queue_capacity: config.hub.session_queue_capacity,
    };

    let state = AppState::with_hub_config(store, api_config.clone(), hub_config);

    serve(state, &api_config).await?;

    tracing::info!("Parley stopped");
    Ok(())
}

/// Initialize tracing from the logging config
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "parley={},tower_http=info",
            config.logging.level
        ))
    });

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
