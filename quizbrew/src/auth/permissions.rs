//! Permission checks for the coffee-shop API.
//!
//! A gated handler names the permission it needs in its signature:
//!
//! ```ignore
//! pub async fn delete_drink(
//!     State(state): State<AppState>,
//!     _: RequiresPermission<permission::DeleteDrinks>,
//!     IdPath(id): IdPath<DrinkId>,
//! ) -> Result<Json<DrinkDeletedResponse>, Error> { ... }
//! ```
//!
//! The extractor runs before the path and body extractors, so a rejected request never reaches
//! the handler body and nothing is written.

use crate::{
    AppState,
    auth::{
        error::AuthError,
        token::{Claims, bearer_token},
    },
    errors::Error,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use std::{fmt, marker::PhantomData};
use tracing::{instrument, trace};

/// Capabilities a token can carry in its `permissions` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "get:drinks-detail")]
    ReadDrinkDetail,
    #[serde(rename = "post:drinks")]
    CreateDrinks,
    #[serde(rename = "patch:drinks")]
    UpdateDrinks,
    #[serde(rename = "delete:drinks")]
    DeleteDrinks,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ReadDrinkDetail => "get:drinks-detail",
            Permission::CreateDrinks => "post:drinks",
            Permission::UpdateDrinks => "patch:drinks",
            Permission::DeleteDrinks => "delete:drinks",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-level permission, so a handler's requirement is part of its signature
pub trait RequiredPermission {
    const PERMISSION: Permission;
}

pub mod permission {
    use super::{Permission, RequiredPermission};

    pub struct GetDrinksDetail;
    pub struct PostDrinks;
    pub struct PatchDrinks;
    pub struct DeleteDrinks;

    impl RequiredPermission for GetDrinksDetail {
        const PERMISSION: Permission = Permission::ReadDrinkDetail;
    }

    impl RequiredPermission for PostDrinks {
        const PERMISSION: Permission = Permission::CreateDrinks;
    }

    impl RequiredPermission for PatchDrinks {
        const PERMISSION: Permission = Permission::UpdateDrinks;
    }

    impl RequiredPermission for DeleteDrinks {
        const PERMISSION: Permission = Permission::DeleteDrinks;
    }
}

impl Claims {
    /// Check that the token grants `required`
    pub fn require(&self, required: Permission) -> Result<(), AuthError> {
        let granted = self.permissions.as_ref().ok_or(AuthError::PermissionsMissing)?;
        if granted.iter().any(|p| p == required.as_str()) {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied { required })
        }
    }
}

/// Extractor that only succeeds for requests bearing a verified token with permission `P`.
///
/// The verified claims are handed to the handler; handlers never re-check them.
pub struct RequiresPermission<P> {
    pub claims: Claims,
    _permission: PhantomData<P>,
}

impl<P> RequiresPermission<P> {
    /// Token subject, when the issuer sets one
    pub fn subject(&self) -> Option<&str> {
        self.claims.sub.as_deref()
    }
}

impl<P> FromRequestParts<AppState> for RequiresPermission<P>
where
    P: RequiredPermission + Send + Sync,
{
    type Rejection = Error;

    #[instrument(skip_all, fields(required = %P::PERMISSION))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let verifier = state.token_verifier.as_deref().ok_or(AuthError::NotConfigured)?;

        let token = bearer_token(&parts.headers)?;
        let claims = verifier.verify(token)?;
        claims.require(P::PERMISSION)?;

        trace!(subject = ?claims.sub, "permission granted");
        Ok(Self {
            claims,
            _permission: PhantomData,
        })
    }
}
