mod config;
mod errors;
mod layout;
mod models;
mod render;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::render::{CachedRenderOracle, CommandRenderOracle, RenderOracle};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting pagefit v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the render oracle
    let oracle = build_oracle(&config)?;

    // Build app state (applies FIT_CONFIG_PATH, if set)
    let state = AppState::new(config, oracle)?;
    info!(
        cv_target = state.cv.target_pages,
        cover_letter_target = state.cover_letter.target_pages,
        step_budget = state.cv.step_budget,
        "Fit profiles ready"
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", state.config.port).parse()?;

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Command renderer, behind the content-digest cache unless its capacity is 0.
fn build_oracle(config: &Config) -> Result<Arc<dyn RenderOracle>> {
    let command = CommandRenderOracle::from_command_line(&config.render_command, config.render_timeout)?;
    info!(
        program = command.program(),
        timeout_ms = config.render_timeout.as_millis() as u64,
        cache_capacity = config.render_cache_capacity,
        "Render oracle initialized"
    );

    if config.render_cache_capacity == 0 {
        return Ok(Arc::new(command));
    }
    Ok(Arc::new(CachedRenderOracle::new(
        command,
        config.render_cache_capacity,
    )))
}
