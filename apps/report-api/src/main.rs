mod backend;
mod config;
mod errors;
mod models;
mod report;
mod routes;
mod state;
mod workflow;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::backend::HttpInterviewBackend;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview Report API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize upstream interview API client
    let backend = Arc::new(HttpInterviewBackend::new(
        config.interview_api_url.clone(),
        config.probe_timeout,
    ));
    info!("Interview API client initialized ({})", backend.base_url());

    let policy = &config.workflow;
    info!(
        "Workflow policy: readiness deadline {:?} every {:?}, {} timeout retries after {:?}",
        policy.readiness.deadline,
        policy.readiness.interval,
        policy.max_timeout_retries,
        policy.retry_backoff
    );

    // Build app state
    let state = AppState::new(backend, config.clone());

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the interview frontend

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
