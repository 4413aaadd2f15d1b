//! Bearer token extraction
//!
//! Lets handlers (and downstream routers sharing the signing secret) require a
//! valid session token.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::Utc;
use std::sync::Arc;

use crate::auth::{AuthService, Claims};
use crate::error::ApiError;

/// Wallet authenticated by a bearer token
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(wallet: AuthenticatedWallet) -> impl IntoResponse {
///     format!("Hello, {}", wallet.address)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedWallet {
    pub address: String,
    pub claims: Claims,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedWallet
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    ApiError::Unauthorized(
                        "Authorization header with Bearer token required".to_string(),
                    )
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);
        let claims = auth_service.token_claims(bearer.token(), Utc::now())?;

        Ok(AuthenticatedWallet {
            address: claims.address.clone(),
            claims,
        })
    }
}
