use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    middleware::{
        cookies::{clear_cookie, get_cookie, set_cookie, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
        csrf::{generate_token, CSRF_COOKIE},
    },
    models::{
        auth::TokenPair,
        user::{
            ForgotPasswordRequest, LoginRequest, LoginResponse, RefreshTokenRequest,
            RegisterRequest, ResetPasswordRequest,
        },
    },
    routes::{extract::Json, ok},
    services::auth::{AuthService, FORGOT_PASSWORD_MESSAGE},
    AppState,
};

type SetCookies = AppendHeaders<[(HeaderName, String); 3]>;

/// Access, refresh and CSRF cookies for a freshly issued pair. Only the
/// CSRF cookie is readable by scripts.
pub fn session_cookies(state: &AppState, tokens: &TokenPair) -> SetCookies {
    let secure = state.config.cookie_secure;
    let refresh_max_age = state.tokens.refresh_ttl().num_seconds();
    AppendHeaders([
        (
            header::SET_COOKIE,
            set_cookie(ACCESS_TOKEN_COOKIE, &tokens.access_token, tokens.expires_in, true, secure),
        ),
        (
            header::SET_COOKIE,
            set_cookie(REFRESH_TOKEN_COOKIE, &tokens.refresh_token, refresh_max_age, true, secure),
        ),
        (
            header::SET_COOKIE,
            set_cookie(CSRF_COOKIE, &generate_token(), refresh_max_age, false, secure),
        ),
    ])
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<Value>> {
    let user = AuthService::register(&state, &body).await?;
    Ok(ok("User registered", user))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Response> {
    let (user, tokens) = AuthService::login(&state, &body).await?;
    let cookies = session_cookies(&state, &tokens);
    Ok((cookies, ok("Login successful", LoginResponse { user, tokens })).into_response())
}

/// POST /api/v1/auth/refresh
///
/// The refresh token is read from its cookie, else from a JSON body
/// `{"refresh_token": "..."}`.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let token = match get_cookie(&headers, REFRESH_TOKEN_COOKIE).filter(|t| !t.is_empty()) {
        Some(cookie) => Some(cookie),
        None if body.is_empty() => None,
        None => {
            serde_json::from_slice::<RefreshTokenRequest>(&body)
                .map_err(|_| AppError::bad_request("Invalid request body"))?
                .refresh_token
        }
    };

    let tokens = AuthService::refresh(&state, token.as_deref()).await?;
    let cookies = session_cookies(&state, &tokens);
    Ok((cookies, ok("Token refreshed", tokens)).into_response())
}

/// POST /api/v1/auth/logout
pub async fn logout(State(state): State<AppState>) -> Response {
    let secure = state.config.cookie_secure;
    let cookies = AppendHeaders([
        (header::SET_COOKIE, clear_cookie(ACCESS_TOKEN_COOKIE, true, secure)),
        (header::SET_COOKIE, clear_cookie(REFRESH_TOKEN_COOKIE, true, secure)),
        (header::SET_COOKIE, clear_cookie(CSRF_COOKIE, false, secure)),
    ]);
    (cookies, ok("Logged out", ())).into_response()
}

/// POST /api/v1/auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> AppResult<Json<Value>> {
    AuthService::forgot_password(&state, &body).await?;
    Ok(ok(FORGOT_PASSWORD_MESSAGE, ()))
}

/// POST /api/v1/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> AppResult<Json<Value>> {
    AuthService::reset_password(&state, &body).await?;
    Ok(ok("Password has been reset", ()))
}
