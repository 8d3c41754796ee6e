//! RFC 7807 problem details
//!
//! Every error response of the API has the same body:
//! `{type, title, status, detail, instance, timestamp, errors?}` with
//! `content-type: application/problem+json`. `instance` is left empty here
//! and filled with the request URI by
//! [`problem_instance_middleware`](crate::interfaces::http::middleware::problem_instance_middleware).

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::shared::{AppError, DomainError, InfraError};

pub const PROBLEM_JSON: &str = "application/problem+json";

/// A single field-level validation error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    #[schema(example = "pageSize")]
    pub field: String,
    #[schema(example = "must be between 1 and 100")]
    pub message: String,
}

/// RFC 7807 error body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    #[schema(example = "https://httpstatuses.com/400")]
    pub type_url: String,
    #[schema(example = "BadRequest")]
    pub title: String,
    #[schema(example = 400)]
    pub status: u16,
    #[schema(example = "Validation failed")]
    pub detail: String,
    #[schema(example = "/api/v1/surf/recent-times?pageSize=500")]
    pub instance: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// `(title, default detail)` for a status code.
fn describe(status: StatusCode) -> (&'static str, &'static str) {
    match status {
        StatusCode::BAD_REQUEST => ("BadRequest", "Validation failed"),
        StatusCode::UNAUTHORIZED => ("Unauthorized", "Invalid credentials"),
        StatusCode::FORBIDDEN => ("Forbidden", "Access denied"),
        StatusCode::NOT_FOUND => ("NotFound", "Resource not found"),
        StatusCode::CONFLICT => ("Conflict", "Conflict occurred"),
        StatusCode::UNPROCESSABLE_ENTITY => ("UnprocessableEntity", "Semantic validation failed"),
        StatusCode::SERVICE_UNAVAILABLE => {
            ("ServiceUnavailable", "Service temporarily unavailable")
        }
        _ => ("InternalServerError", "Internal server error"),
    }
}

impl ProblemDetails {
    pub fn new(status: StatusCode) -> Self {
        let (title, detail) = describe(status);
        Self {
            type_url: format!("https://httpstatuses.com/{}", status.as_u16()),
            title: title.to_string(),
            status: status.as_u16(),
            detail: detail.to_string(),
            instance: String::new(),
            timestamp: Utc::now(),
            errors: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::new(StatusCode::BAD_REQUEST).with_errors(errors)
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match serde_json::to_vec(&self) {
            Ok(body) => body,
            Err(e) => {
                error!("Failed to serialize problem details: {}", e);
                return status.into_response();
            }
        };
        (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON))],
            body,
        )
            .into_response()
    }
}

impl From<&AppError> for ProblemDetails {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::Domain(DomainError::NotFound { .. }) => {
                ProblemDetails::new(StatusCode::NOT_FOUND).with_detail(err.to_string())
            }
            AppError::Domain(DomainError::Validation(msg)) => {
                ProblemDetails::validation(vec![FieldError {
                    field: String::new(),
                    message: msg.clone(),
                }])
            }
            AppError::Domain(DomainError::Conflict(msg)) => {
                ProblemDetails::new(StatusCode::CONFLICT).with_detail(msg.clone())
            }
            AppError::Domain(DomainError::Unauthorized(_)) => {
                ProblemDetails::new(StatusCode::UNAUTHORIZED)
            }
            AppError::Domain(DomainError::Forbidden(_)) => ProblemDetails::new(StatusCode::FORBIDDEN),
            AppError::Infra(infra) if infra.is_transient() => {
                ProblemDetails::new(StatusCode::SERVICE_UNAVAILABLE)
            }
            AppError::Infra(_) => ProblemDetails::new(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let problem = ProblemDetails::from(&self);
        if let AppError::Infra(infra) = &self {
            log_infra_error(infra, problem.status);
        }
        problem.into_response()
    }
}

fn log_infra_error(err: &InfraError, status: u16) {
    error!(status, error = %err, "Upstream failure while handling request");
}
