use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    middleware::{
        cookies::{clear_cookie, get_cookie, set_cookie},
        csrf::generate_token,
    },
    models::user::LoginResponse,
    routes::{auth::session_cookies, extract::Query, ok},
    services::{auth::AuthService, oauth::OAuthProvider},
    AppState,
};

const OAUTH_STATE_COOKIE: &str = "oauth_state";
const OAUTH_STATE_MAX_AGE: i64 = 600;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

fn provider(state: &AppState) -> AppResult<&dyn OAuthProvider> {
    state
        .oauth
        .as_deref()
        .ok_or_else(|| AppError::internal("Google OAuth is not configured"))
}

/// GET /api/v1/oauth/google/login
pub async fn google_login(State(state): State<AppState>) -> AppResult<Response> {
    let nonce = generate_token();
    let url = provider(&state)?.authorize_url(&nonce);
    let cookie = set_cookie(
        OAUTH_STATE_COOKIE,
        &nonce,
        OAUTH_STATE_MAX_AGE,
        true,
        state.config.cookie_secure,
    );
    Ok((AppendHeaders([(header::SET_COOKIE, cookie)]), Redirect::temporary(&url)).into_response())
}

/// GET /api/v1/oauth/google/callback
pub async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Response> {
    let code = query
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing authorization code"))?;

    let expected = get_cookie(&headers, OAUTH_STATE_COOKIE).filter(|s| !s.is_empty());
    if expected.is_none() || expected != query.state {
        tracing::warn!("oauth callback with mismatched state");
        return Err(AppError::bad_request("Invalid OAuth state"));
    }

    let email = provider(&state)?.exchange(code).await?;
    let (user, tokens) = AuthService::oauth_login(&state, &email).await?;

    let clear_state = clear_cookie(OAUTH_STATE_COOKIE, true, state.config.cookie_secure);
    Ok((
        session_cookies(&state, &tokens),
        AppendHeaders([(header::SET_COOKIE, clear_state)]),
        ok("Login successful", LoginResponse { user, tokens }),
    )
        .into_response())
}
