//! HTTP service surface for the PR review agent.

use std::{env, error::Error, sync::Arc};

mod routes;
mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing::info;

use crate::routes::{
    health::health_check, review::review_pr, search::search_prs, servers::list_servers,
};
use crate::state::AppState;

/// Starts the HTTP service on `API_ADDRESS` (default `0.0.0.0:5000`).
pub async fn start() -> Result<(), Box<dyn Error>> {
    let host_url = env::var("API_ADDRESS").unwrap_or_else(|_| "0.0.0.0:5000".to_string());

    let state = Arc::new(AppState::from_env());

    let app = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/servers", get(list_servers))
        .route("/api/search", get(search_prs))
        .route("/api/review", post(review_pr))
        .with_state(state);

    info!("Listening on {}", host_url);
    let listener = tokio::net::TcpListener::bind(&host_url).await?;

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
}
