//! Fills the `instance` member of problem documents with the request URI.

use axum::{
    body::{Body, Bytes},
    http::{header, Request},
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::interfaces::http::common::PROBLEM_JSON;

pub async fn problem_instance_middleware(request: Request<Body>, next: Next) -> Response {
    let instance = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;
    let is_problem = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with(PROBLEM_JSON));
    if !is_problem {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let Ok(bytes) = axum::body::to_bytes(body, usize::MAX).await else {
        return Response::from_parts(parts, Body::empty());
    };
    let mut problem: Value = match serde_json::from_slice(&bytes) {
        Ok(v) => v,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };

    if let Some(obj) = problem.as_object_mut() {
        let empty = obj
            .get("instance")
            .and_then(Value::as_str)
            .map_or(true, str::is_empty);
        if empty {
            obj.insert("instance".to_string(), Value::from(instance));
        }
    }

    parts.headers.remove(header::CONTENT_LENGTH);
    let bytes = serde_json::to_vec(&problem).map(Bytes::from).unwrap_or(bytes);
    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::http::common::ProblemDetails;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{middleware, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn fills_instance_from_uri() {
        let app = Router::new()
            .route("/x", get(|| async { ProblemDetails::new(StatusCode::NOT_FOUND) }))
            .layer(middleware::from_fn(problem_instance_middleware));

        let resp = app
            .oneshot(Request::builder().uri("/x?page=2").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let v: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["instance"], "/x?page=2");
    }
}
