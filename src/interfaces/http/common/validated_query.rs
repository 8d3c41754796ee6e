//! Validated query-string extractor
//!
//! `ValidatedQuery<T>` works like `axum::extract::Query<T>` and then runs
//! `validator::Validate::validate()`. Both malformed and out-of-range
//! parameters are rejected with a 400 problem document listing the offending
//! fields by their wire (camelCase) names.

use axum::extract::rejection::QueryRejection;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use super::problem::{FieldError, ProblemDetails};

pub struct ValidatedQuery<T>(pub T);

pub enum ValidatedQueryRejection {
    Query(QueryRejection),
    Validation(ValidationErrors),
}

/// `page_size` → `pageSize`
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            let field = camel_case(&field.to_string());
            errs.iter().map(move |e| FieldError {
                field: field.clone(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

impl IntoResponse for ValidatedQueryRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Query(rejection) => ProblemDetails::new(StatusCode::BAD_REQUEST)
                .with_detail(rejection.body_text())
                .into_response(),
            Self::Validation(errors) => ProblemDetails::validation(field_errors(&errors)).into_response(),
        }
    }
}

impl<S, T> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedQueryRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(ValidatedQueryRejection::Query)?;

        value.validate().map_err(ValidatedQueryRejection::Validation)?;

        Ok(ValidatedQuery(value))
    }
}
