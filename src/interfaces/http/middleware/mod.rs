//! HTTP middleware
//!
//! Applied by the router from outermost to innermost:
//! request id, observability, problem instance, wrap response, response
//! time, pagination headers and (leaderboard routes only) cache versioning.

pub mod cache_versioning;
pub mod observability;
pub mod pagination_headers;
pub mod problem_instance;
pub mod request_id;
pub mod response_time;
pub mod wrap_response;

pub use cache_versioning::{cache_versioning_middleware, weak_etag, CacheState, ResponseCache};
pub use observability::observability_middleware;
pub use pagination_headers::pagination_headers_middleware;
pub use problem_instance::problem_instance_middleware;
pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
pub use response_time::response_time_middleware;
pub use wrap_response::wrap_response_middleware;
