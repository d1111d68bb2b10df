//! Failures of the bearer-token permission gate.

use crate::auth::permissions::Permission;
use axum::http::StatusCode;
use thiserror::Error;

/// Why a request was turned away before reaching a gated handler.
///
/// The `Display` text is the description shown to clients; [`AuthError::code`] is the stable
/// machine-readable code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header is expected.")]
    HeaderMissing,

    #[error("Authorization header must start with \"Bearer\".")]
    NotBearer,

    #[error("Token not found.")]
    TokenMissing,

    #[error("Authorization header must be bearer token.")]
    TooManyParts,

    /// Token header has no `kid` while verifying against a key set
    #[error("Authorization malformed.")]
    MissingKeyId,

    #[error("Unable to find the appropriate key.")]
    UnknownKey,

    /// Signature, encoding or structure failure
    #[error("Unable to parse authentication token.")]
    Malformed { reason: String },

    #[error("Token expired.")]
    Expired,

    #[error("Incorrect claims. Please, check the audience and issuer.")]
    InvalidClaims,

    #[error("Permissions not included in JWT.")]
    PermissionsMissing,

    #[error("Permission not found.")]
    PermissionDenied { required: Permission },

    /// The coffee service was started without a verification key
    #[error("Token verification is not configured.")]
    NotConfigured,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::HeaderMissing => "authorization_header_missing",
            AuthError::NotBearer
            | AuthError::TokenMissing
            | AuthError::TooManyParts
            | AuthError::MissingKeyId
            | AuthError::UnknownKey
            | AuthError::Malformed { .. } => "invalid_header",
            AuthError::Expired => "token_expired",
            AuthError::InvalidClaims | AuthError::PermissionsMissing => "invalid_claims",
            AuthError::PermissionDenied { .. } => "unauthorized",
            AuthError::NotConfigured => "auth_not_configured",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::PermissionsMissing => StatusCode::BAD_REQUEST,
            AuthError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            AuthError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}
