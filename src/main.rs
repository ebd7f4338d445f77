use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use marketplace_api::config;
use marketplace_api::database::{DatabaseManager, MemoryStore, PgStore, Store};
use marketplace_api::{app, AppState};

#[derive(Parser)]
#[command(name = "marketplace-api")]
#[command(about = "Marketplace products JSON API")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides API_PORT/PORT)")]
    port: Option<u16>,

    #[arg(long, default_value = "0.0.0.0", help = "Address to bind")]
    bind: String,

    #[arg(long, help = "PostgreSQL URL (overrides DATABASE_URL)")]
    database_url: Option<String>,

    #[arg(long, help = "Keep all data in memory instead of PostgreSQL")]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, APP_ENV, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("marketplace_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let config = config::config().clone();
    tracing::info!("Starting marketplace API in {:?} mode", config.environment);

    let store: Arc<dyn Store> = if args.in_memory {
        tracing::warn!("Using in-memory store; data is lost on shutdown");
        Arc::new(MemoryStore::new())
    } else {
        let url = args
            .database_url
            .or_else(|| config.database.url.clone())
            .context("DATABASE_URL is not set (pass --in-memory to run without PostgreSQL)")?;
        let pool = DatabaseManager::connect(&url, &config.database)
            .await
            .context("failed to connect to PostgreSQL")?;
        DatabaseManager::ensure_schema(&pool)
            .await
            .context("failed to create database schema")?;
        Arc::new(PgStore::new(pool))
    };

    let port = args.port.unwrap_or(config.api.port);
    let bind_addr = format!("{}:{}", args.bind, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Marketplace API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app(AppState::new(store, config)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Marketplace API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
