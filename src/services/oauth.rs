use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::{
    config::Config,
    error::{AppError, AppResult},
};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USER_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// External authorization-code exchange. The only thing we take from the
/// provider is a verified email address.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Where to send the browser. `state` comes back on the callback.
    fn authorize_url(&self, state: &str) -> String;

    async fn exchange(&self, code: &str) -> AppResult<String>;
}

#[derive(Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GoogleUserResponse {
    email: String,
    #[serde(default)]
    verified_email: bool,
}

pub struct GoogleOAuth {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl GoogleOAuth {
    /// Returns None unless client id, secret and redirect URI are all set.
    pub fn new(config: &Config) -> Option<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .ok()?;
        Some(Self {
            client,
            client_id: config.google_client_id.clone()?,
            client_secret: config.google_client_secret.clone()?,
            redirect_uri: config.google_redirect_uri.clone()?,
        })
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuth {
    fn authorize_url(&self, state: &str) -> String {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ];
        match Url::parse_with_params(GOOGLE_AUTH_URL, &params) {
            Ok(url) => url.into(),
            Err(_) => GOOGLE_AUTH_URL.to_string(),
        }
    }

    async fn exchange(&self, code: &str) -> AppResult<String> {
        let token: GoogleTokenResponse = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::internal(format!("google token exchange: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::internal(format!("google token response: {e}")))?;

        let user: GoogleUserResponse = self
            .client
            .get(GOOGLE_USER_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::internal(format!("google userinfo: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::internal(format!("google userinfo response: {e}")))?;

        if !user.verified_email || user.email.trim().is_empty() {
            return Err(AppError::unauthorized("Google account email is not verified"));
        }
        Ok(user.email.trim().to_string())
    }
}
