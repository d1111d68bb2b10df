//! Bearer-token authorization for the coffee-shop API.
//!
//! Gated endpoints declare the permission they need with the [`permissions::RequiresPermission`]
//! extractor. Before the handler runs, the extractor:
//!
//! 1. reads the token from `Authorization: Bearer <token>` ([`token::bearer_token`]),
//! 2. verifies signature, expiry, issuer and audience ([`token::TokenVerifier`]),
//! 3. checks the `permissions` claim for the required [`permissions::Permission`].
//!
//! Any failure becomes an [`error::AuthError`], rendered with its status and code:
//!
//! ```text
//! authorization_header_missing  401
//! invalid_header                401
//! token_expired                 401
//! invalid_claims                401 (400 when the permissions claim is absent)
//! unauthorized                  403
//! ```
//!
//! The trivia API is not gated.

pub mod error;
pub mod permissions;
pub mod token;
