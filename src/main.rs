//! Announcement query server — binary entrypoint.
//! Boots the Axum HTTP server over the most recently persisted feed table.
//!
//! The aggregation pass itself runs separately (`aggregate` binary); this
//! process only reads what that pass wrote.

use stock_feed_aggregator::{api, ingest, metrics::Metrics};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = ingest::config::load_default().unwrap_or_default();
    let metrics = Metrics::init(cfg.window_days);

    let state = api::AppState::from_env();
    let router = api::create_router(state).merge(metrics.router());

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "5005".to_string());
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "query server listening");
    axum::serve(listener, router).await?;

    Ok(())
}
