//! Payroll engine HTTP server.
//!
//! Reads `HOST_ADDRESS` and `PAYROLL_CONFIG_DIR` from the environment (or a
//! `.env` file) and serves the API over an in-memory store.

use anyhow::Context;
use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::{ConfigLoader, ServerSettings};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_line_number(true))
        .init();

    let settings = ServerSettings::from_env().context("invalid server settings")?;
    let config = ConfigLoader::load(&settings.config_dir).with_context(|| {
        format!(
            "failed to load payroll configuration from {}",
            settings.config_dir.display()
        )
    })?;

    let router = create_router(AppState::in_memory(config));
    let listener = tokio::net::TcpListener::bind(settings.host_address)
        .await
        .with_context(|| format!("failed to bind {}", settings.host_address))?;

    info!(address = %settings.host_address, "Payroll engine listening");
    axum::serve(listener, router).await.context("server error")?;

    Ok(())
}
