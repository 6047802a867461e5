//! Historias Web Server
//!
//! Run with: cargo run -p historias-web

use historias_client::HttpBackend;
use historias_common::Config;
use historias_web::state::{AppState, SharedState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    // Initialize tracing; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(backend = %config.backend.base_url, "Starting Historias Web Server...");

    let backend = HttpBackend::new(&config.backend)?;
    let state: SharedState = Arc::new(AppState::new(Arc::new(backend)));

    // Initial load runs in the background; pages show a loading state meanwhile
    {
        let state = state.clone();
        tokio::spawn(async move {
            state.reload().await;
        });
    }

    let app = historias_web::router::build_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind.as_str()).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
