//! Double-submit CSRF protection.
//!
//! A random token is set as a script-readable cookie at login and refresh.
//! Mutating requests must echo it in the `X-CSRF-Token` header. The header
//! is never defaulted from the cookie.

use axum::{
    extract::Request,
    http::{HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rand::{rngs::OsRng, RngCore};
use subtle::ConstantTimeEq;

use crate::{
    error::AppError, middleware::cookies::get_cookie, services::metrics::CSRF_REJECTED_COUNTER,
};

pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Endpoints reached before a session exists.
pub const EXEMPT_PATHS: &[&str] = &[
    "/api/v1/auth/login",
    "/api/v1/auth/register",
    "/api/v1/auth/forgot-password",
    "/api/v1/auth/reset-password",
];

pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Constant-time for equal lengths; a length mismatch fails outright.
fn tokens_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[derive(Debug, PartialEq, Eq)]
pub enum CsrfVerdict {
    Skip,
    Pass,
    MissingCookie,
    MissingHeader,
    Mismatch,
}

/// Pure decision over method, path and headers.
pub fn check(method: &Method, path: &str, headers: &HeaderMap) -> CsrfVerdict {
    if is_safe(method) || EXEMPT_PATHS.contains(&path.trim_end_matches('/')) {
        return CsrfVerdict::Skip;
    }

    let Some(cookie) = get_cookie(headers, CSRF_COOKIE).filter(|c| !c.is_empty()) else {
        return CsrfVerdict::MissingCookie;
    };
    let Some(header) = headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
    else {
        return CsrfVerdict::MissingHeader;
    };

    if tokens_match(&cookie, header) {
        CsrfVerdict::Pass
    } else {
        CsrfVerdict::Mismatch
    }
}

pub async fn csrf_protect(req: Request, next: Next) -> Response {
    let verdict = check(req.method(), req.uri().path(), req.headers());
    let reason = match verdict {
        CsrfVerdict::Skip | CsrfVerdict::Pass => return next.run(req).await,
        CsrfVerdict::MissingCookie => "CSRF token missing",
        CsrfVerdict::MissingHeader => "CSRF header missing",
        CsrfVerdict::Mismatch => "Invalid CSRF token",
    };

    CSRF_REJECTED_COUNTER.inc();
    tracing::warn!(
        method = %req.method(),
        path = %req.uri().path(),
        "csrf rejected: {reason}"
    );
    AppError::forbidden(reason).into_response()
}
