//! Metrics handlers
//!
//! - `GET /metrics` renders the global `metrics-exporter-prometheus` recorder
//! - `GET /api/v1/metrics/snapshot` returns the in-process aggregator view

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::application::{MetricsSnapshot, SharedMetrics};

/// Shared state for the metrics endpoints
#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
    pub aggregator: SharedMetrics,
}

/// `GET /metrics`: Prometheus scrape endpoint
pub async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    let body = state.handle.render();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/metrics/snapshot",
    tag = "Metrics",
    responses(
        (status = 200, description = "Current metrics window", body = MetricsSnapshot)
    )
)]
pub async fn metrics_snapshot(State(state): State<MetricsState>) -> Json<MetricsSnapshot> {
    Json(state.aggregator.snapshot())
}
