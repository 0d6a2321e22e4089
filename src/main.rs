use anyhow::Context;
use dotenvy::dotenv;
use learnhub::logging::init_tracing;
use learnhub::metrics::{init_metrics, metrics_app};
use learnhub::router::init_router;
use learnhub::state::init_app_state;
use learnhub_config::ServerConfig;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = ServerConfig::from_env();
    init_tracing(&config)?;

    if let Some(handle) = init_metrics()? {
        let metrics_address = config.metrics_address();
        let listener = tokio::net::TcpListener::bind(&metrics_address)
            .await
            .with_context(|| format!("Failed to bind metrics listener on {}", metrics_address))?;
        info!(address = %metrics_address, "Metrics available at /metrics");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                error!(error = %e, "Metrics server stopped");
            }
        });
    }

    let state = init_app_state().await?;
    let app = init_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!(address = %address, "🚀 Server running");
    info!("📚 Swagger UI available at http://{}/swagger-ui", address);
    info!("📖 Scalar UI available at http://{}/scalar", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
