//! Adds `durationMs` (whole milliseconds) to JSON object responses.

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use serde_json::Value;

use crate::interfaces::http::common::{json_object, replace_json_body};

pub const DURATION_FIELD: &str = "durationMs";

pub async fn response_time_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;

    let (parts, mut body) = match json_object(response).await {
        Ok(found) => found,
        Err(untouched) => return untouched,
    };
    let ms = start.elapsed().as_millis() as u64;
    body.insert(DURATION_FIELD.to_string(), Value::from(ms));
    replace_json_body(parts, &Value::Object(body))
}
