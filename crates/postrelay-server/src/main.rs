//! postrelay - HTTP to SMTP relay
//!
//! Accepts JSON email requests and submits them through Gmail or Office365.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use postrelay_core::{Relay, RelayConfig};
use postrelay_server::{app, AppState, RelayMetrics};
use postrelay_smtp::SmtpClient;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("postrelay=info,tower_http=info")),
        )
        .init();

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Starting postrelay in {:?} mode with {} sender(s)",
        config.mode,
        config.senders.len()
    );

    let transport = SmtpClient::new().with_timeout(config.smtp_timeout);
    let relay =
        Relay::new(config.senders, Arc::new(transport)).with_mailer_name(config.mailer_name);
    let metrics = RelayMetrics::new().context("failed to register metrics")?;
    let state = AppState::new(relay, config.mode, metrics, config.trusted_proxies)
        .with_body_limit(config.max_body_bytes);

    for endpoint in state.routes.endpoints() {
        tracing::info!("POST /{}", endpoint);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Server starting on port {}", config.port);

    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutting down");
    })
    .await
    .context("server error")?;

    Ok(())
}
