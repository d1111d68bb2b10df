//! Route handlers. Each handler performs one repository operation and renders the result; failures
//! are returned as [`Error`] with the status the endpoint is specified to answer with.

use axum::http::Uri;

use crate::errors::Error;

pub mod categories;
pub mod drinks;
pub mod questions;
pub mod quizzes;

/// Router fallback for paths that match no route
pub async fn route_not_found(uri: Uri) -> Error {
    Error::not_found(format!("Route {}", uri.path()))
}

/// Fallback for routes that exist but not for the request method
pub async fn method_not_allowed() -> Error {
    Error::MethodNotAllowed
}

/// Liveness probe
pub async fn healthz() -> &'static str {
    "OK"
}
