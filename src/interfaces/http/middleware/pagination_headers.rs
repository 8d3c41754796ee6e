//! Pagination response headers
//!
//! - `Access-Control-Expose-Headers` on every response so browsers can read
//!   the headers below
//! - `X-Total-Count` and an RFC 5988 `Link` header for paged bodies

use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use serde_json::{Map, Value};

use crate::interfaces::http::common::{json_object, replace_json_body};

pub const TOTAL_COUNT_HEADER: &str = "x-total-count";
pub const EXPOSED_HEADERS: &str = "X-Total-Count, Link, ETag";

/// `<url>; rel="first", ...`; `prev`/`next` only when present.
pub fn link_header(links: &Map<String, Value>) -> Option<String> {
    let mut parts = Vec::with_capacity(5);
    for rel in ["first", "prev", "self", "next", "last"] {
        match links.get(rel).and_then(Value::as_str) {
            Some(url) => parts.push(format!("<{}>; rel=\"{}\"", url, rel)),
            None if matches!(rel, "prev" | "next") => {}
            None => return None,
        }
    }
    Some(parts.join(", "))
}

pub async fn pagination_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(EXPOSED_HEADERS),
    );

    let (mut parts, body) = match json_object(response).await {
        Ok(found) => found,
        Err(untouched) => return untouched,
    };

    let total = body
        .get("meta")
        .and_then(|m| m.get("total"))
        .and_then(Value::as_u64);
    let link = body
        .get("links")
        .and_then(Value::as_object)
        .and_then(link_header);

    if let (Some(total), Some(link)) = (total, link) {
        parts
            .headers
            .insert(TOTAL_COUNT_HEADER, HeaderValue::from(total));
        if let Ok(value) = HeaderValue::from_str(&link) {
            parts.headers.insert(header::LINK, value);
        }
    }

    replace_json_body(parts, &Value::Object(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::{middleware, Json, Router};
    use serde_json::json;
    use tower::ServiceExt;

    fn links(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn link_header_skips_missing_prev_and_next() {
        let header = link_header(&links(json!({
            "first": "/a?page=1",
            "prev": null,
            "self": "/a?page=1",
            "next": "/a?page=2",
            "last": "/a?page=3"
        })))
        .unwrap();
        assert_eq!(
            header,
            "</a?page=1>; rel=\"first\", </a?page=1>; rel=\"self\", </a?page=2>; rel=\"next\", </a?page=3>; rel=\"last\""
        );
    }

    #[test]
    fn link_header_requires_mandatory_links() {
        assert!(link_header(&links(json!({"first": "/a"}))).is_none());
    }

    #[tokio::test]
    async fn sets_headers_for_paged_bodies() {
        let app = Router::new()
            .route(
                "/paged",
                get(|| async {
                    Json(json!({
                        "data": [],
                        "meta": {"total": 42},
                        "links": {"first": "/p?page=1", "self": "/p?page=1", "last": "/p?page=5", "prev": null, "next": "/p?page=2"}
                    }))
                }),
            )
            .route("/plain", get(|| async { "hi" }))
            .layer(middleware::from_fn(pagination_headers_middleware));

        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/paged").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.headers()[TOTAL_COUNT_HEADER], "42");
        assert!(resp.headers()[header::LINK]
            .to_str()
            .unwrap()
            .contains("rel=\"next\""));

        let resp = app
            .oneshot(Request::builder().uri("/plain").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_EXPOSE_HEADERS], EXPOSED_HEADERS);
        assert!(resp.headers().get(TOTAL_COUNT_HEADER).is_none());
    }
}
