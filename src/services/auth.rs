use crate::{
    error::{AppError, AppResult},
    models::{
        auth::{TokenKind, TokenPair},
        user::{
            ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, UserSummary,
        },
    },
    services::{
        captcha::CaptchaStore,
        metrics::auth_attempt,
        password::{hash_password, verify_password},
        token::TokenError,
    },
    AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Same answer whether or not the address is registered.
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for this email, a password reset link has been sent";

/// Consumes the challenge before anything else looks at the request.
pub fn check_captcha(store: &CaptchaStore, id: &str, answer: &str) -> AppResult<()> {
    if id.trim().is_empty() || answer.trim().is_empty() {
        return Err(AppError::bad_request("Captcha is required"));
    }
    if !store.verify(id.trim(), answer) {
        return Err(AppError::bad_request("Invalid or expired captcha"));
    }
    Ok(())
}

fn signing_failed(e: TokenError) -> AppError {
    AppError::internal(format!("token signing: {e}"))
}

pub struct AuthService;

impl AuthService {
    pub async fn register(state: &AppState, req: &RegisterRequest) -> AppResult<UserSummary> {
        check_captcha(&state.captcha, &req.captcha_id, &req.captcha_answer)?;

        let email = req.email.trim();
        if email.is_empty() {
            return Err(AppError::bad_request("Email is required"));
        }
        if req.password.is_empty() {
            return Err(AppError::bad_request("Password is required"));
        }

        let hash = hash_password(&req.password, state.config.bcrypt_cost)?;
        let user = state.credentials.create_user(email, &hash).await;
        match &user {
            Ok(u) => {
                auth_attempt("register", "success");
                tracing::info!(user_id = u.id, "user registered");
            }
            Err(AppError::Conflict(_)) => auth_attempt("register", "conflict"),
            Err(_) => auth_attempt("register", "error"),
        }
        user
    }

    /// Unknown email, password-less account and wrong password all answer
    /// with the same `Unauthorized`.
    pub async fn login(state: &AppState, req: &LoginRequest) -> AppResult<(UserSummary, TokenPair)> {
        check_captcha(&state.captcha, &req.captcha_id, &req.captcha_answer)?;

        let email = req.email.trim();
        if email.is_empty() {
            return Err(AppError::bad_request("Email is required"));
        }
        if req.password.is_empty() {
            return Err(AppError::bad_request("Password is required"));
        }

        let Some(record) = state.credentials.find_by_email(email).await? else {
            auth_attempt("login", "failure");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };
        let Some(hash) = record.password_hash.as_deref() else {
            auth_attempt("login", "failure");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };
        if !verify_password(hash, &req.password)? {
            auth_attempt("login", "failure");
            tracing::info!(user_id = record.user_id, "login rejected: wrong password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        let tokens = state.tokens.issue_pair(record.user_id).map_err(signing_failed)?;
        auth_attempt("login", "success");
        tracing::info!(user_id = record.user_id, "user logged in");

        Ok((
            UserSummary {
                id: record.user_id,
                email: record.email,
            },
            tokens,
        ))
    }

    /// New pair for a valid refresh token. The presented token stays valid.
    pub async fn refresh(state: &AppState, refresh_token: Option<&str>) -> AppResult<TokenPair> {
        let token = refresh_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthorized("Refresh token missing"))?;

        let identity = state
            .tokens
            .validate(token, TokenKind::Refresh)
            .map_err(|_| {
                auth_attempt("refresh", "failure");
                AppError::unauthorized("Invalid refresh token")
            })?;

        if !state.credentials.user_exists(identity.user_id).await? {
            auth_attempt("refresh", "failure");
            return Err(AppError::unauthorized("Invalid refresh token"));
        }

        auth_attempt("refresh", "success");
        state.tokens.issue_pair(identity.user_id).map_err(signing_failed)
    }

    /// Mails a reset link when the account exists. Callers always answer
    /// with [`FORGOT_PASSWORD_MESSAGE`].
    pub async fn forgot_password(state: &AppState, req: &ForgotPasswordRequest) -> AppResult<()> {
        check_captcha(&state.captcha, &req.captcha_id, &req.captcha_answer)?;

        let email = req.email.trim();
        if email.is_empty() {
            return Err(AppError::bad_request("Email is required"));
        }
        let mailer = state
            .email
            .as_ref()
            .ok_or_else(|| AppError::internal("password reset requested but SMTP is not configured"))?;

        let Some(record) = state.credentials.find_by_email(email).await? else {
            tracing::info!("password reset requested for unknown email");
            return Ok(());
        };

        let token = state.tokens.issue_reset_token(record.user_id).map_err(signing_failed)?;
        let reset_url = format!(
            "{}/reset-password?token={token}",
            state.config.frontend_url.trim_end_matches('/')
        );

        if let Err(e) = mailer.send_password_reset(&record.email, &reset_url).await {
            tracing::error!(user_id = record.user_id, "failed to send password reset email: {e:#}");
        } else {
            tracing::info!(user_id = record.user_id, "password reset email sent");
        }
        Ok(())
    }

    pub async fn reset_password(state: &AppState, req: &ResetPasswordRequest) -> AppResult<()> {
        if req.new_password.is_empty() {
            return Err(AppError::bad_request("New password is required"));
        }
        let identity = state
            .tokens
            .validate(req.token.trim(), TokenKind::PasswordReset)
            .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

        let hash = hash_password(&req.new_password, state.config.bcrypt_cost)?;
        state.credentials.update_password(identity.user_id, &hash).await?;
        tracing::info!(user_id = identity.user_id, "password reset");
        Ok(())
    }

    /// Maps the provider's verified email onto one local account and opens
    /// a session for it exactly as a password login would.
    pub async fn oauth_login(state: &AppState, email: &str) -> AppResult<(UserSummary, TokenPair)> {
        let user = state.credentials.find_or_create_oauth_user(email).await?;
        let tokens = state.tokens.issue_pair(user.id).map_err(signing_failed)?;
        auth_attempt("oauth", "success");
        tracing::info!(user_id = user.id, "user logged in with OAuth");
        Ok((user, tokens))
    }
}
