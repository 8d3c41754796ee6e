//! Helpers for middleware that rewrite JSON response bodies

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use serde_json::{Map, Value};
use tracing::warn;

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}

/// Buffer a `application/json` response whose body is a JSON object.
///
/// Returns the response parts and the parsed object, or the response
/// rebuilt untouched when it is not a JSON object.
pub async fn json_object(
    response: Response,
) -> Result<(axum::http::response::Parts, Map<String, Value>), Response> {
    if !is_json(response.headers()) {
        return Err(response);
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Failed to buffer response body: {}", e);
            return Err(Response::from_parts(parts, Body::empty()));
        }
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok((parts, map)),
        _ => Err(Response::from_parts(parts, Body::from(bytes))),
    }
}

/// Re-serialize `value` into the response, dropping the stale `Content-Length`.
pub fn replace_json_body(mut parts: axum::http::response::Parts, value: &Value) -> Response {
    parts.headers.remove(header::CONTENT_LENGTH);
    let bytes = serde_json::to_vec(value).map(Bytes::from).unwrap_or_default();
    Response::from_parts(parts, Body::from(bytes))
}
