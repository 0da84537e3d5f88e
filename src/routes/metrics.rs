use axum::{extract::State, http::StatusCode};
use prometheus::{Encoder, TextEncoder};

use crate::services::metrics;
use crate::AppState;

/// GET /metrics — Prometheus scrape endpoint (internal only, protected by nginx).
pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    metrics::refresh_gauges(&state.db).await;

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
