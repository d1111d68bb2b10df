use crate::auth::error::AuthError;
use crate::db::errors::DbError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::error::Error as StdError;
use thiserror::Error as ThisError;

/// Request-level error, rendered as a `{success: false, error, message}` JSON envelope.
///
/// Each endpoint answers failures with a fixed status, so the storage layer's [`DbError`] is
/// carried as a `source` for logging rather than deciding the status itself. Only errors that no
/// endpoint claims ([`Error::Database`]) are classified from the database error.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Malformed request body or a read the endpoint reports as a bad request
    #[error("{message}")]
    BadRequest {
        message: String,
        #[source]
        source: Option<DbError>,
    },

    /// Requested resource, page or route not found
    #[error("{resource} not found")]
    NotFound {
        resource: String,
        #[source]
        source: Option<DbError>,
    },

    /// Request was well-formed but the operation could not be applied
    #[error("Failed to {operation}")]
    Unprocessable {
        operation: String,
        #[source]
        source: Option<DbError>,
    },

    /// Path exists but not for this HTTP method
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Bearer token missing, invalid, or lacking the required permission
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Database error not claimed by any endpoint
    #[error(transparent)]
    Database(#[from] DbError),

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest {
            message: message.into(),
            source: None,
        }
    }

    pub fn bad_request_because(message: impl Into<String>, source: DbError) -> Self {
        Error::BadRequest {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Error::NotFound {
            resource: resource.into(),
            source: None,
        }
    }

    pub fn not_found_because(resource: impl Into<String>, source: DbError) -> Self {
        Error::NotFound {
            resource: resource.into(),
            source: Some(source),
        }
    }

    pub fn unprocessable(operation: impl Into<String>) -> Self {
        Error::Unprocessable {
            operation: operation.into(),
            source: None,
        }
    }

    pub fn unprocessable_because(operation: impl Into<String>, source: DbError) -> Self {
        Error::Unprocessable {
            operation: operation.into(),
            source: Some(source),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Error::Auth(auth_err) => auth_err.status_code(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } | DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::InvalidData { .. } | DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details.
    ///
    /// Apart from auth failures, the message only depends on the status.
    pub fn user_message(&self) -> String {
        match self {
            Error::Auth(auth_err) => auth_err.to_string(),
            _ => canonical_message(self.status_code()).to_string(),
        }
    }

    fn log(&self) {
        match self {
            Error::Database(DbError::InvalidData { .. } | DbError::Other(_)) | Error::Internal { .. } => {
                tracing::error!("Internal service error: {:#}", error_chain(self));
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", error_chain(self));
            }
            Error::BadRequest { source: Some(_), .. }
            | Error::NotFound { source: Some(_), .. }
            | Error::Unprocessable { source: Some(_), .. } => {
                tracing::warn!("Request failed on database operation: {}", error_chain(self));
            }
            Error::Auth(auth_err) => {
                tracing::info!("Authorization error: {} ({:?})", auth_err.code(), auth_err);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::Unprocessable { .. } | Error::MethodNotAllowed => {
                tracing::debug!("Client error: {}", self);
            }
        }
    }
}

/// Render an error with its whole `source()` chain on one line
fn error_chain(err: &Error) -> String {
    let mut rendered = err.to_string();
    let mut source = StdError::source(err);
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = StdError::source(cause);
    }
    rendered
}

/// Fixed message for each status, as shown to API clients
pub fn canonical_message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "Bad request",
        StatusCode::UNAUTHORIZED => "Unauthorized",
        StatusCode::FORBIDDEN => "Forbidden",
        StatusCode::NOT_FOUND => "Resource not found",
        StatusCode::METHOD_NOT_ALLOWED => "Method not allowed",
        StatusCode::CONFLICT => "Conflict",
        StatusCode::UNPROCESSABLE_ENTITY => "Unprocessable",
        _ => "Internal server error",
    }
}

/// Marker left on every response rendered from an [`Error`], so router layers can re-render the
/// envelope without re-parsing the body.
#[derive(Debug, Clone, Copy)]
pub struct RenderedError(pub StatusCode);

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        self.log();

        let status = self.status_code();
        let body = match &self {
            Error::Auth(auth_err) => json!({
                "success": false,
                "error": status.as_u16(),
                "code": auth_err.code(),
                "message": auth_err.to_string(),
            }),
            _ => json!({
                "success": false,
                "error": status.as_u16(),
                "message": self.user_message().to_lowercase(),
            }),
        };

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(RenderedError(status));
        response
    }
}

/// Re-render error envelopes with the status code as a string and a capitalised message:
/// `{"success": false, "error": "404", "message": "Resource not found"}`.
///
/// Used as a `map_response` layer on the trivia router; successful responses pass through.
pub async fn with_string_error_codes(response: Response) -> Response {
    let Some(RenderedError(status)) = response.extensions().get::<RenderedError>().copied() else {
        return response;
    };

    let body = json!({
        "success": false,
        "error": status.as_u16().to_string(),
        "message": canonical_message(status),
    });

    let mut rendered = (status, Json(body)).into_response();
    rendered.extensions_mut().insert(RenderedError(status));
    rendered
}

/// Convert from sqlx errors hit outside a repository (pool acquisition, transactions)
impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Database(DbError::from(err))
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_endpoint_statuses_ignore_the_database_cause() {
        let err = Error::unprocessable_because("delete question 7", DbError::NotFound);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = Error::not_found_because(
            "Drink",
            DbError::UniqueViolation {
                constraint: None,
                table: Some("drinks".to_string()),
                message: "UNIQUE constraint failed: drinks.title".to_string(),
            },
        );
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_unclaimed_database_errors_are_classified() {
        assert_eq!(Error::Database(DbError::NotFound).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::Database(DbError::Other(anyhow::anyhow!("disk I/O error"))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_user_message_does_not_leak_causes() {
        let err = Error::bad_request_because("list drinks", DbError::Other(anyhow::anyhow!("database is locked")));
        assert_eq!(err.user_message(), "Bad request");

        let err = Error::Internal {
            operation: "load JWKS from https://example.auth0.com".to_string(),
        };
        assert_eq!(err.user_message(), "Internal server error");
    }

    #[tokio::test]
    async fn test_numeric_envelope() {
        let response = Error::unprocessable("create question").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], 422);
        assert_eq!(body["message"], "unprocessable");
    }

    #[tokio::test]
    async fn test_auth_envelope_carries_code_and_description() {
        let response = Error::from(AuthError::HeaderMissing).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["error"], 401);
        assert_eq!(body["code"], "authorization_header_missing");
        assert_eq!(body["message"], "Authorization header is expected.");
    }

    #[tokio::test]
    async fn test_string_error_codes_rewrites_only_errors() {
        let response = with_string_error_codes(Error::not_found("Page 1000 of questions").into_response()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "404");
        assert_eq!(body["message"], "Resource not found");

        let ok = with_string_error_codes((StatusCode::OK, Json(json!({"success": true}))).into_response()).await;
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(body_json(ok).await["success"], true);
    }
}
