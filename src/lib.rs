pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::{sync::Arc, time::Duration};

use chrono::Duration as TokenTtl;
use sqlx::PgPool;

use config::Config;
use middleware::rate_limit::RateLimiter;
use services::{
    audit::{AuditRecorder, PgAuditStore},
    captcha::CaptchaStore,
    credentials::{CredentialStore, PgCredentialStore},
    email::EmailService,
    oauth::{GoogleOAuth, OAuthProvider},
    roles::{PgRoleDirectory, RoleDirectory},
    token::{TokenConfig, TokenService},
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub tokens: Arc<TokenService>,
    pub captcha: Arc<CaptchaStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub roles: Arc<dyn RoleDirectory>,
    pub audit: AuditRecorder,
    pub auth_limiter: RateLimiter,
    pub api_limiter: RateLimiter,
    pub email: Option<Arc<EmailService>>,
    pub oauth: Option<Arc<dyn OAuthProvider>>,
}

impl AppState {
    /// Wires the Postgres-backed stores, SMTP and Google OAuth from config.
    /// SMTP and OAuth stay `None` when their settings are absent.
    pub fn new(config: Config, db: PgPool) -> Self {
        let tokens = TokenService::new(token_config(&config));
        let email = EmailService::new(&config).map(Arc::new);
        let oauth = GoogleOAuth::new(&config).map(|g| Arc::new(g) as Arc<dyn OAuthProvider>);

        Self {
            credentials: Arc::new(PgCredentialStore::new(db.clone())),
            roles: Arc::new(PgRoleDirectory::new(db.clone())),
            audit: AuditRecorder::new(Arc::new(PgAuditStore::new(db.clone()))),
            auth_limiter: RateLimiter::new("auth", config.auth_rate_limit),
            api_limiter: RateLimiter::new("api", config.api_rate_limit),
            tokens: Arc::new(tokens),
            captcha: Arc::new(CaptchaStore::new()),
            email,
            oauth,
            config: Arc::new(config),
            db,
        }
    }

    pub fn captcha_ttl(&self) -> Duration {
        Duration::from_secs(self.config.captcha_ttl_seconds)
    }
}

pub fn token_config(config: &Config) -> TokenConfig {
    TokenConfig {
        access_ttl: TokenTtl::seconds(config.access_token_ttl_seconds),
        refresh_ttl: TokenTtl::days(config.refresh_token_ttl_days),
        ..TokenConfig::new(config.jwt_secret.clone())
    }
}
