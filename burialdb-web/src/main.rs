//! burialdb - records of the fallen and missing
//!
//! Serves the JSON API and landing page over HTTP, backed by a SQLite
//! database and a media folder inside the root folder.

use anyhow::{Context, Result};
use burialdb_common::api::auth::load_shared_secret;
use burialdb_common::config::{
    load_config, resolve_root_folder, RootFolder, DEFAULT_BIND, ENV_ROOT_FOLDER,
};
use burialdb_common::db::init::init_database;
use burialdb_web::storage::MediaStorage;
use burialdb_web::{build_router, AppState};
use clap::Parser;
use std::path::PathBuf;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "burialdb")]
#[command(about = "Burial and missing persons record keeping service")]
#[command(version)]
struct Args {
    /// Root folder holding the database and media files
    /// (falls back to BURIALDB_ROOT, the config file, then the OS default)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, env = "BURIALDB_BIND")]
    bind: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "BURIALDB_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "burialdb=info,burialdb_web=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();
    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    let root = RootFolder::new(resolve_root_folder(
        args.root_folder.as_deref(),
        ENV_ROOT_FOLDER,
        &config,
    ));
    root.ensure_directory_exists()
        .with_context(|| format!("Cannot prepare root folder {}", root.path().display()))?;
    info!("Root folder: {}", root.path().display());

    let db_path = root.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let shared_secret = load_shared_secret(&pool)
        .await
        .context("Failed to load API shared secret")?;
    if shared_secret == 0 {
        info!("API authentication disabled (shared_secret = 0)");
    } else {
        info!("Loaded shared secret for API authentication");
    }

    let state = AppState::new(pool, shared_secret, MediaStorage::new(root.media_dir()))
        .with_page_size(config.page_size())
        .with_max_upload_bytes(config.max_upload_bytes());
    let app = build_router(state);

    let bind = args
        .bind
        .or(config.bind)
        .unwrap_or_else(|| DEFAULT_BIND.to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Cannot listen on {}", bind))?;
    info!("burialdb listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, shutting down");
    }
}
