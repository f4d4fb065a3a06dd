//! Bearer-token authentication against the host identity directory.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::domain::Caller;
use crate::error::GatewayError;

/// Extractor yielding the [`Caller`] behind an `Authorization: Bearer`
/// header. Rejects with [`GatewayError::Unauthenticated`] when the header
/// is missing or the token is unknown.
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller(pub Caller);

impl FromRequestParts<AppState> for AuthenticatedCaller {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(GatewayError::Unauthenticated)?;
        let caller = state
            .directory
            .resolve_token(token)
            .await?
            .ok_or(GatewayError::Unauthenticated)?;
        Ok(Self(caller))
    }
}

/// Returns the token of an `Authorization: Bearer <token>` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
