//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `scribe-run` binary also loads a
//! `.env` file before serving the same router.

use scribe_core::ServiceConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the scribe REST API server
///
/// # Environment Variables
/// - `SCRIBE_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `SCRIBE_MAX_BODY_BYTES`: Request body cap in bytes (default: 262144)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration values are invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = ServiceConfig::from_env_values(
        std::env::var("SCRIBE_REST_ADDR").ok(),
        std::env::var("SCRIBE_MAX_BODY_BYTES").ok(),
    )?;

    tracing::info!("-- Starting scribe REST API on {}", cfg.rest_addr());

    let listener = tokio::net::TcpListener::bind(cfg.rest_addr()).await?;
    axum::serve(listener, api_rest::router(&cfg)).await?;

    Ok(())
}
