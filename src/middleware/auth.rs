use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    middleware::cookies::{get_cookie, ACCESS_TOKEN_COOKIE},
    models::auth::{Identity, TokenKind},
    services::token::{TokenError, TokenService},
};

/// The access token of a request: `Authorization: Bearer` first, then the
/// `access_token` cookie. A present but malformed header is rejected
/// rather than skipped.
pub fn access_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthorized("Invalid Authorization header format"))?;
        return Ok(Some(token.to_string()));
    }
    Ok(get_cookie(headers, ACCESS_TOKEN_COOKIE).filter(|t| !t.is_empty()))
}

/// Resolves the caller and binds their [`Identity`] to the request.
pub async fn auth_required(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = access_token(req.headers())?
        .ok_or_else(|| AppError::unauthorized("Missing authentication token"))?;

    let identity = tokens
        .validate(&token, TokenKind::Access)
        .map_err(|e| match e {
            TokenError::InvalidToken => AppError::unauthorized("Invalid or expired token"),
            // Signed by us but unreadable: a server-side fault, not a deny.
            TokenError::MalformedClaims | TokenError::Signing(_) => {
                AppError::internal(format!("access token rejected: {e}"))
            }
        })?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Absent only on a route that was wired without `auth_required`.
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .ok_or_else(|| AppError::internal("identity requested on an unauthenticated route"))
    }
}
