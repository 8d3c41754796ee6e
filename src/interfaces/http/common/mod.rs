//! Shared HTTP building blocks: problem documents, extractors, body helpers

pub mod body;
pub mod problem;
pub mod validated_query;

pub use body::{json_object, replace_json_body};
pub use problem::{FieldError, ProblemDetails, PROBLEM_JSON};
pub use validated_query::ValidatedQuery;
