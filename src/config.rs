use std::env;

use ipnetwork::IpNetwork;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_days: i64,
    pub host: String,
    pub port: u16,
    /// `development` or `production`; drives the CORS origin.
    pub app_env: String,
    pub cors_origin: String,
    pub frontend_url: String,
    pub media_dir: String,
    pub cookie_secure: bool,
    pub bcrypt_cost: u32,
    pub captcha_ttl_seconds: u64,
    pub auth_rate_limit: RateLimitSetting,
    pub api_rate_limit: RateLimitSetting,
    pub ip_whitelist: Vec<IpNetwork>,
    pub ip_blacklist: Vec<IpNetwork>,
    /// Read the client address from X-Real-IP / X-Forwarded-For.
    /// Only enable behind a reverse proxy that overwrites these headers.
    pub trust_proxy_headers: bool,
    /// Account granted the `admin` role on startup.
    pub admin_email: Option<String>,
    // SMTP (optional)
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    // Google OAuth (optional)
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_uri: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSetting {
    pub max_requests: u32,
    pub window_seconds: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl_seconds: env::var("ACCESS_TOKEN_TTL_SECONDS")
                .unwrap_or_else(|_| "3600".into())
                .parse()?,
            refresh_token_ttl_days: env::var("REFRESH_TOKEN_TTL_DAYS")
                .unwrap_or_else(|_| "7".into())
                .parse()?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            app_env: optional("APP_ENV").unwrap_or_else(|| "development".into()),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "https://blueink.id".into()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            media_dir: env::var("MEDIA_DIR").unwrap_or_else(|_| "./media".into()),
            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            bcrypt_cost: env::var("BCRYPT_COST")
                .unwrap_or_else(|_| bcrypt::DEFAULT_COST.to_string())
                .parse()?,
            captcha_ttl_seconds: env::var("CAPTCHA_TTL_SECONDS")
                .unwrap_or_else(|_| "300".into())
                .parse()?,
            auth_rate_limit: rate_limit("AUTH_RATE_LIMIT", 5, 60)?,
            api_rate_limit: rate_limit("API_RATE_LIMIT", 30, 60)?,
            ip_whitelist: parse_ip_rules(&env::var("IP_WHITELIST").unwrap_or_default())?,
            ip_blacklist: parse_ip_rules(&env::var("IP_BLACKLIST").unwrap_or_default())?,
            trust_proxy_headers: env::var("TRUST_PROXY_HEADERS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            admin_email: optional("ADMIN_EMAIL"),
            smtp_host: optional("SMTP_HOST"),
            smtp_port: env::var("SMTP_PORT").ok().and_then(|v| v.parse().ok()),
            smtp_username: optional("SMTP_USERNAME"),
            smtp_password: optional("SMTP_PASSWORD"),
            smtp_from: optional("SMTP_FROM"),
            google_client_id: optional("GOOGLE_CLIENT_ID"),
            google_client_secret: optional("GOOGLE_CLIENT_SECRET"),
            google_redirect_uri: optional("GOOGLE_REDIRECT_URI"),
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).map_err(|_| anyhow::anyhow!("Missing required env var: {}", key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Reads `<max>/<window seconds>`, e.g. `AUTH_RATE_LIMIT=5/60`.
fn rate_limit(key: &str, max: u32, window: u64) -> anyhow::Result<RateLimitSetting> {
    match optional(key) {
        None => Ok(RateLimitSetting {
            max_requests: max,
            window_seconds: window,
        }),
        Some(raw) => parse_rate_limit(&raw)
            .ok_or_else(|| anyhow::anyhow!("{key} must look like <max>/<seconds>, got {raw:?}")),
    }
}

fn parse_rate_limit(raw: &str) -> Option<RateLimitSetting> {
    let (max, window) = raw.split_once('/')?;
    let max_requests = max.trim().parse().ok()?;
    let window_seconds = window.trim().parse().ok()?;
    if max_requests == 0 || window_seconds == 0 {
        return None;
    }
    Some(RateLimitSetting {
        max_requests,
        window_seconds,
    })
}

/// Parses a comma-separated list of single addresses or CIDR ranges.
/// A bare address becomes a host-sized network (/32 or /128).
pub fn parse_ip_rules(raw: &str) -> anyhow::Result<Vec<IpNetwork>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|rule| {
            rule.parse::<IpNetwork>()
                .map_err(|e| anyhow::anyhow!("Invalid IP rule {rule:?}: {e}"))
        })
        .collect()
}
