//! Response cache with ETag revalidation
//!
//! Successful `GET` JSON responses are kept in memory for a TTL, keyed by
//! `GET:<path>?<query>`. Every cacheable response carries a weak ETag over the
//! handler body plus `Cache-Control: public, max-age=<ttl>` and
//! `X-Cache: HIT|MISS`. A matching `If-None-Match` short-circuits to
//! `304 Not Modified`. Hits and misses are reported to the metrics aggregator.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::application::SharedMetrics;

pub const X_CACHE_HEADER: &str = "x-cache";

#[derive(Debug, Clone)]
struct CachedResponse {
    stored_at: Instant,
    status: StatusCode,
    content_type: HeaderValue,
    body: Bytes,
    etag: String,
}

/// In-memory response store, expired lazily on read.
#[derive(Debug)]
pub struct ResponseCache {
    entries: DashMap<String, CachedResponse>,
    ttl: Duration,
    max_entries: usize,
}

impl ResponseCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_fresh(&self, key: &str) -> Option<CachedResponse> {
        let entry = self.entries.get(key)?.value().clone();
        if entry.stored_at.elapsed() < self.ttl {
            return Some(entry);
        }
        self.entries.remove(key);
        None
    }

    fn insert(&self, key: String, entry: CachedResponse) {
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            let ttl = self.ttl;
            self.entries.retain(|_, e| e.stored_at.elapsed() < ttl);

            if self.entries.len() >= self.max_entries {
                let oldest = self
                    .entries
                    .iter()
                    .min_by_key(|e| e.stored_at)
                    .map(|e| e.key().clone());
                if let Some(oldest) = oldest {
                    self.entries.remove(&oldest);
                }
            }
        }
        self.entries.insert(key, entry);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[derive(Clone)]
pub struct CacheState {
    pub cache: Arc<ResponseCache>,
    pub metrics: SharedMetrics,
}

/// Weak entity tag over a response body: `W/"<sha256 hex>"`.
pub fn weak_etag(body: &[u8]) -> String {
    format!("W/\"{}\"", hex::encode(Sha256::digest(body)))
}

/// Weak comparison of an `If-None-Match` header against `etag`.
fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
    let strip = |t: &str| t.trim().trim_start_matches("W/").to_string();
    let ours = strip(etag);
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|candidate| candidate.trim() == "*" || strip(candidate) == ours)
}

fn cache_headers(headers: &mut HeaderMap, etag: &str, ttl: Duration, hit: bool) {
    if let Ok(value) = HeaderValue::from_str(etag) {
        headers.insert(header::ETAG, value);
    }
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", ttl.as_secs())) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    headers.insert(
        X_CACHE_HEADER,
        HeaderValue::from_static(if hit { "HIT" } else { "MISS" }),
    );
}

fn render(entry: &CachedResponse, request_headers: &HeaderMap, ttl: Duration, hit: bool) -> Response {
    if if_none_match(request_headers, &entry.etag) {
        let mut response = StatusCode::NOT_MODIFIED.into_response();
        cache_headers(response.headers_mut(), &entry.etag, ttl, hit);
        return response;
    }

    let mut response = Response::new(Body::from(entry.body.clone()));
    *response.status_mut() = entry.status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, entry.content_type.clone());
    cache_headers(response.headers_mut(), &entry.etag, ttl, hit);
    response
}

fn is_cacheable(response: &Response) -> Option<HeaderValue> {
    if !response.status().is_success() {
        return None;
    }
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .filter(|ct| {
            ct.to_str()
                .map(|ct| ct.starts_with("application/json"))
                .unwrap_or(false)
        })
        .cloned()
}

pub async fn cache_versioning_middleware(
    State(state): State<CacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = format!(
        "GET:{}",
        request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| request.uri().path())
    );
    let request_headers = request.headers().clone();
    let ttl = state.cache.ttl();

    if let Some(entry) = state.cache.get_fresh(&key) {
        state.metrics.record_cache_hit();
        debug!("Cache hit for {}", key);
        return render(&entry, &request_headers, ttl, true);
    }

    state.metrics.record_cache_miss();
    debug!("Cache miss for {}", key);

    let response = next.run(request).await;
    let Some(content_type) = is_cacheable(&response) else {
        return response;
    };

    let (parts, body) = response.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to buffer response for {}: {}", key, e);
            return Response::from_parts(parts, Body::empty());
        }
    };

    let entry = CachedResponse {
        stored_at: Instant::now(),
        status: parts.status,
        content_type,
        etag: weak_etag(&body),
        body,
    };
    state.cache.insert(key, entry.clone());

    render(&entry, &request_headers, ttl, false)
}
