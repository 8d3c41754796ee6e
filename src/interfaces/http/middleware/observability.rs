//! Request observability middleware
//!
//! Times every request and feeds the result to the in-process
//! [`MetricsAggregator`](crate::application::MetricsAggregator) and to the
//! Prometheus recorder:
//!
//! - **`http_requests_total`**: counter with labels `method`, `path`, `status`
//! - **`http_request_duration_seconds`**: histogram with labels `method`, `path`
//!
//! Prometheus labels use the matched route template so that path parameters
//! and query strings do not explode label cardinality; the aggregator keeps
//! the full request URI for its slowest-requests list.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{error, info, warn};

use crate::application::SharedMetrics;

pub async fn observability_middleware(
    State(metrics): State<SharedMetrics>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let uri = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();
    let ms = elapsed.as_secs_f64() * 1_000.0;

    let status = response.status();
    let is_error = status.is_client_error() || status.is_server_error();
    metrics.record_request(&format!("{} {}", method, uri), ms, is_error);

    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => route.clone(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method.clone(), "path" => route)
        .record(elapsed.as_secs_f64());

    if status.is_server_error() {
        error!(status = status.as_u16(), "[{}] {} → {:.0}ms", method, uri, ms);
    } else if status.is_client_error() {
        warn!(status = status.as_u16(), "[{}] {} → {:.0}ms", method, uri, ms);
    } else {
        info!(status = status.as_u16(), "[{}] {} → {:.0}ms", method, uri, ms);
    }

    response
}
