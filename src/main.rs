use scribe_core::ServiceConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the scribe service
///
/// Loads a `.env` file if present, resolves configuration once and serves the REST API with
/// OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `SCRIBE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `SCRIBE_MAX_BODY_BYTES`: Request body cap in bytes (default: 262144)
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or the server itself fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("scribe=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = ServiceConfig::from_env_values(
        std::env::var("SCRIBE_REST_ADDR").ok(),
        std::env::var("SCRIBE_MAX_BODY_BYTES").ok(),
    )?;

    tracing::info!("++ Starting scribe REST on {}", cfg.rest_addr());
    tracing::info!("++ Request body cap {} bytes", cfg.max_body_bytes());

    let listener = tokio::net::TcpListener::bind(cfg.rest_addr()).await?;
    axum::serve(listener, api_rest::router(&cfg))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- Scribe REST stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
