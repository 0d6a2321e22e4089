use axum::{
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use learnhub_config::ServerConfig;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Logs each request with a request id, echoed back in `x-request-id`.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    info!(request_id = %request_id, method = %method, path = %path, "Incoming request");

    let mut response = next.run(req).await;
    let latency_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    match status {
        400..=499 => warn!(request_id = %request_id, method = %method, path = %path, status, latency_ms, "Client error"),
        500..=599 => error!(request_id = %request_id, method = %method, path = %path, status, latency_ms, "Server error"),
        _ => info!(request_id = %request_id, method = %method, path = %path, status, latency_ms, "Request completed"),
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Installs the console, error-file and JSON-file layers.
///
/// `RUST_LOG` overrides the console filter; otherwise `LOG_LEVEL` applies to
/// this crate and its workspace crates.
pub fn init_tracing(config: &ServerConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.log_dir)?;

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{crate}={level},learnhub={level},tower_http=warn,axum::rejection=trace",
            crate = env!("CARGO_CRATE_NAME"),
            level = config.log_level,
        ))
    });

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .with_filter(console_filter);

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.log_dir, "learnhub.log");

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_filter(EnvFilter::new("error"));

    // Structured logs for ingestion
    let json_appender = RollingFileAppender::new(Rotation::DAILY, &config.log_dir, "learnhub.json");

    let json_layer = fmt::layer()
        .json()
        .with_writer(json_appender)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(json_layer)
        .try_init()?;

    info!(log_dir = %config.log_dir, "Tracing initialized");
    Ok(())
}
