//! # Shigu Server
//!
//! Runs the catalogue HTTP API, or validates configuration without serving.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use shigu_core::config::{ConfigManager, ShiguConfig, StorageBackend};
use shigu_core::database::{run_migrations, DatabaseConnection};
use shigu_core::logging;
use shigu_core::store::{MemoryStore, PgStore};
use shigu_core::web::{create_app, state::AppState};

#[derive(Parser)]
#[command(name = "shigu-server")]
#[command(about = "Goods catalogue API with drag-and-drop ordering")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration directory (default: ./config or SHIGU_CONFIG_DIR)
    #[arg(short, long, env = "SHIGU_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Environment name (default: SHIGU_ENV, APP_ENV, then development)
    #[arg(short, long)]
    environment: Option<String>,

    /// Override server.bind_address
    #[arg(short, long)]
    bind: Option<String>,

    /// Serve from the in-memory store instead of PostgreSQL
    #[arg(long)]
    memory: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API (default)
    Serve,

    /// Load and validate configuration, print it as JSON and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let environment = cli
        .environment
        .clone()
        .unwrap_or_else(ConfigManager::detect_environment);
    let manager = ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &environment)
        .context("failed to load configuration")?;

    let mut config = manager.config().clone();
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    if cli.memory {
        config.database.backend = StorageBackend::Memory;
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::CheckConfig => {
            config.validate().context("invalid configuration")?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Serve => serve(config, &environment).await,
    }
}

async fn serve(config: ShiguConfig, environment: &str) -> Result<()> {
    logging::init_with_config(&config.logging);

    let state = match config.database.backend {
        StorageBackend::Memory => {
            let store = MemoryStore::new(config.sequencing.lock_timeout());
            AppState::with_memory(store, config.clone())
        }
        StorageBackend::Postgres => {
            let connection = DatabaseConnection::connect(&config.database)
                .await
                .context("failed to connect to PostgreSQL")?;
            if config.database.run_migrations {
                run_migrations(connection.pool())
                    .await
                    .context("failed to run migrations")?;
            }
            let store = PgStore::new(connection.pool().clone(), &config.sequencing);
            AppState::with_postgres(store, config.clone())
        }
    };

    let bind_address = config.server.bind_address.clone();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    info!(
        bind_address = %bind_address,
        environment = environment,
        backend = ?config.database.backend,
        "Shigu API listening"
    );

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shigu API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
