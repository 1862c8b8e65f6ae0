use crate::error::{ApiError, Result};
use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Header carrying the caller's account id, set by the upstream auth gateway
pub const ACCOUNT_ID_HEADER: &str = "x-account-id";

/// Account the request acts on behalf of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountIdentity {
    pub account_id: Uuid,
}

/// Resolves `x-account-id` into an `AccountIdentity` request extension.
///
/// The gateway in front of this service has already authenticated the caller;
/// this layer only parses what it forwarded. Missing or malformed ids are 401.
pub async fn identity_middleware(mut request: Request, next: Next) -> Result<Response> {
    let raw = request
        .headers()
        .get(ACCOUNT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized(format!("Missing {} header", ACCOUNT_ID_HEADER)))?;

    let account_id = Uuid::parse_str(raw.trim()).map_err(|_| {
        ApiError::Unauthorized(format!("Malformed {} header", ACCOUNT_ID_HEADER))
    })?;

    request
        .extensions_mut()
        .insert(AccountIdentity { account_id });

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AccountIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AccountIdentity>()
            .copied()
            .ok_or_else(|| {
                ApiError::Unauthorized(
                    "Account identity not found - route must be behind identity_middleware"
                        .to_string(),
                )
            })
    }
}
