//! Care desk service - Main Entry Point

use anyhow::{Context, Result};
use caredesk::config::ServiceConfig;
use caredesk::{create_app, AppState};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,caredesk=debug")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting care desk service");

    let config = ServiceConfig::from_env().context("invalid service configuration")?;

    let state = match AppState::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to initialize application state: {:#}", e);
            return Err(e);
        }
    };

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("Care desk listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
