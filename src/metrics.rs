//! Prometheus metrics: HTTP middleware plus import and login counters.
//!
//! Set `OBSERVABILITY_ENABLED=false` to turn every helper into a no-op.

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

/// Installs the Prometheus recorder and its upkeep task.
///
/// Returns `Ok(None)` when observability is disabled.
pub fn init_metrics() -> anyhow::Result<Option<PrometheusHandle>> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ],
        )?
        .install_recorder()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(Some(handle))
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status)
        .increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// Router served on the separate metrics listener.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

pub fn track_rows_parsed(total: usize, valid: usize) {
    if !is_observability_enabled() {
        return;
    }
    counter!("import_rows_parsed_total", "result" => "valid").increment(valid as u64);
    counter!("import_rows_parsed_total", "result" => "invalid")
        .increment(total.saturating_sub(valid) as u64);
}

pub fn track_students_imported(imported: usize, skipped: usize) {
    if !is_observability_enabled() {
        return;
    }
    counter!("students_imported_total").increment(imported as u64);
    counter!("import_rows_skipped_total").increment(skipped as u64);
    histogram!("import_batch_size").record(imported as f64);
}

pub fn track_import_failure(status: u16) {
    if !is_observability_enabled() {
        return;
    }
    counter!("import_failures_total", "status" => status.to_string()).increment(1);
}

pub fn track_school_created() {
    if !is_observability_enabled() {
        return;
    }
    counter!("schools_created_total").increment(1);
}

pub fn track_student_login_success() {
    if !is_observability_enabled() {
        return;
    }
    counter!("student_logins_total", "status" => "success").increment(1);
}

pub fn track_student_login_failure(reason: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("student_logins_total", "status" => "failure", "reason" => reason).increment(1);
}

pub fn track_guest_session_started() {
    if !is_observability_enabled() {
        return;
    }
    counter!("guest_sessions_total").increment(1);
}

pub fn track_admin_token_issued(role: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("admin_tokens_issued_total", "role" => role).increment(1);
}
