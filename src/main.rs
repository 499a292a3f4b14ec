//! Bloodbank - back end for a blood bank: donors, drives, requests and stock.
//!
//! # Configuration
//!
//! - `BLOODBANK_DATABASE_URL`: SQLite connection string (default `sqlite:bloodbank.db?mode=rwc`)
//! - `BLOODBANK_PORT`: listen port (default 5000)
//! - `RUST_LOG`: log filter (default `bloodbank=info`)
//!
//! # API Endpoints
//!
//! - `/api/donors` - Donor registry
//! - `/api/drives` - Donation drives
//! - `/api/requests` - Blood requests
//! - `/api/inventory` - Stock levels, allocation and alerts
//! - `/api/dashboard` - Headline figures
//! - `GET /health` - Health check

use std::env;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use bloodbank::api::{AppState, app};
use bloodbank::storage::Storage;

/// Default port if not specified via environment variable.
const DEFAULT_PORT: u16 = 5000;

/// Default database path if not specified via environment variable.
const DEFAULT_DB_PATH: &str = "sqlite:bloodbank.db?mode=rwc";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("bloodbank=info".parse()?))
        .init();

    let port: u16 = env::var("BLOODBANK_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let db_url =
        env::var("BLOODBANK_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

    info!(port, db_url = %db_url, "Starting Bloodbank server");

    let storage = Storage::new(&db_url).await?;
    info!("Database initialized");

    let app = app(AppState::new(storage));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Bloodbank is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
