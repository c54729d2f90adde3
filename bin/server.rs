// Venue Feed - Web Server
//
// GET /api/health
// GET /api/home?lat=&lng=&page=&limit=   (x-user-id header)

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use venue_feed::api::{build_router, AppState};
use venue_feed::{open_shared, FeedConfig, FeedService};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = FeedConfig::from_env()?;
    info!(
        database = %config.database_path.display(),
        venues = %config.venues_path.display(),
        timezone = %config.timezone,
        max_concurrency = config.max_concurrency,
        "starting venue feed server"
    );

    let conn = open_shared(&config.database_path)?;
    let state = AppState {
        service: Arc::new(FeedService::from_config(&config, conn)),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
