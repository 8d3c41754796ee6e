//! Folds the top-level `durationMs` of a paged body into its `meta`.
//!
//! Applies only to bodies shaped `{data: [..], meta: {..}}`; anything else
//! passes through untouched.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use serde_json::{Map, Value};

use super::response_time::DURATION_FIELD;
use crate::interfaces::http::common::{json_object, replace_json_body};

/// Hands `body` back as `Err` when it is not a paged envelope.
fn wrap(mut body: Map<String, Value>) -> Result<Map<String, Value>, Map<String, Value>> {
    let is_page = body.get("data").is_some_and(Value::is_array)
        && body.get("meta").is_some_and(Value::is_object);
    if !is_page {
        return Err(body);
    }

    let duration = body.remove(DURATION_FIELD).filter(Value::is_number);
    if let (Some(duration), Some(Value::Object(meta))) = (duration, body.get_mut("meta")) {
        meta.insert(DURATION_FIELD.to_string(), duration);
    }
    Ok(body)
}

pub async fn wrap_response_middleware(request: Request<Body>, next: Next) -> Response {
    let response = next.run(request).await;
    let (parts, body) = match json_object(response).await {
        Ok(found) => found,
        Err(untouched) => return untouched,
    };
    let body = match wrap(body) {
        Ok(wrapped) => wrapped,
        Err(untouched) => untouched,
    };
    replace_json_body(parts, &Value::Object(body))
}
