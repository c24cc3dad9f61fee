//! Libman API server
//!
//! # Usage
//! ```bash
//! libman-api                          # serve on 127.0.0.1:5001
//! PORT=8080 SWEEP_INTERVAL_SECS=600 libman-api
//! ```

mod config;
mod error;
mod handlers;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use config::ApiConfig;
use libman_persistence::Database;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ApiConfig::from_env();

    let db = Database::init(&config.database_url).await?;
    tracing::info!(url = %config.database_url, "database ready");

    let state = AppState::new(db);
    spawn_sweep_task(&state, config.sweep_interval_secs);

    let app = routes::create_router(state);
    let addr: SocketAddr = config.bind_address().parse()?;
    tracing::info!("libman api listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Periodic overdue sweep alongside the request loop. The sweep is also
/// exposed at POST /api/transactions/sweep for on-demand runs.
fn spawn_sweep_task(state: &AppState, interval_secs: u64) {
    if interval_secs == 0 {
        tracing::info!("periodic overdue sweep disabled");
        return;
    }

    let sweeper = state.sweeper.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        // The immediate first tick doubles as a startup sweep.
        loop {
            ticker.tick().await;
            if let Err(e) = sweeper.sweep().await {
                tracing::warn!(error = %e, "overdue sweep failed");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
