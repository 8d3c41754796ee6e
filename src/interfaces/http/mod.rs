//! HTTP REST API interfaces
//!
//! - `common`: problem documents, validated extractors, body helpers
//! - `middleware`: request id, observability, response shaping, caching
//! - `modules`: handlers per feature
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, AppState};
