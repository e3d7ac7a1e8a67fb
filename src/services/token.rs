use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::models::auth::{Claims, Identity, RawClaims, TokenKind, TokenPair};

/// Keys and lifetimes for the token service, injected at construction.
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub reset_ttl: Duration,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::hours(1),
            refresh_ttl: Duration::days(7),
            reset_ttl: Duration::hours(1),
        }
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("reset_ttl", &self.reset_ttl)
            .finish()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, wrong algorithm, malformed, expired or wrong kind.
    #[error("invalid token")]
    InvalidToken,
    /// Signature checks out but the subject is absent or not numeric.
    #[error("malformed token claims")]
    MalformedClaims,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues and validates HS256-signed tokens. No revocation: a token stays
/// valid until its `exp`.
pub struct TokenService {
    config: TokenConfig,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Self {
        let encoding = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding,
            decoding,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.config.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.config.refresh_ttl
    }

    pub fn issue_access_token(&self, user_id: i32) -> Result<String, TokenError> {
        self.issue(user_id, TokenKind::Access, self.config.access_ttl)
    }

    pub fn issue_refresh_token(&self, user_id: i32) -> Result<String, TokenError> {
        self.issue(user_id, TokenKind::Refresh, self.config.refresh_ttl)
    }

    pub fn issue_reset_token(&self, user_id: i32) -> Result<String, TokenError> {
        self.issue(user_id, TokenKind::PasswordReset, self.config.reset_ttl)
    }

    /// Fresh access + refresh pair. The previous refresh token is not
    /// invalidated.
    pub fn issue_pair(&self, user_id: i32) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id)?,
            refresh_token: self.issue_refresh_token(user_id)?,
            expires_in: self.config.access_ttl.num_seconds(),
            token_type: "Bearer",
        })
    }

    fn issue(&self, user_id: i32, kind: TokenKind, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verifies signature, algorithm, expiry and kind, then resolves the
    /// subject.
    pub fn validate(&self, token: &str, expected: TokenKind) -> Result<Identity, TokenError> {
        // Only HS256 is accepted; a token announcing any other algorithm
        // (including `none` or an asymmetric one) fails here.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<RawClaims>(token, &self.decoding, &validation).map_err(|e| {
            if let ErrorKind::ExpiredSignature = e.kind() {
                tracing::debug!("rejected expired token");
            }
            TokenError::InvalidToken
        })?;

        if data.claims.kind != expected {
            return Err(TokenError::InvalidToken);
        }
        // `exp == now` passes jsonwebtoken's check; we treat it as expired.
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::InvalidToken);
        }

        data.claims
            .sub
            .as_ref()
            .and_then(Identity::from_subject)
            .ok_or(TokenError::MalformedClaims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn service() -> TokenService {
        TokenService::new(TokenConfig::new(TEST_SECRET))
    }

    fn sign_raw(claims: serde_json::Value, alg: Algorithm, secret: &str) -> String {
        encode(&Header::new(alg), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn access_token_round_trip() {
        let svc = service();
        let token = svc.issue_access_token(42).unwrap();
        assert_eq!(svc.validate(&token, TokenKind::Access), Ok(Identity { user_id: 42 }));
    }

    #[test]
    fn expired_token_is_invalid() {
        let mut config = TokenConfig::new(TEST_SECRET);
        config.access_ttl = Duration::seconds(-1);
        let svc = TokenService::new(config);

        let token = svc.issue_access_token(42).unwrap();
        assert_eq!(svc.validate(&token, TokenKind::Access), Err(TokenError::InvalidToken));
    }

    #[test]
    fn zero_ttl_token_is_already_expired() {
        let mut config = TokenConfig::new(TEST_SECRET);
        config.access_ttl = Duration::zero();
        let svc = TokenService::new(config);

        let token = svc.issue_access_token(7).unwrap();
        assert_eq!(svc.validate(&token, TokenKind::Access), Err(TokenError::InvalidToken));
    }

    #[test]
    fn wrong_key_is_invalid() {
        let token = service().issue_access_token(42).unwrap();
        let other = TokenService::new(TokenConfig::new("another-secret-key-also-32-chars-long!!"));
        assert_eq!(other.validate(&token, TokenKind::Access), Err(TokenError::InvalidToken));
    }

    #[test]
    fn altered_payload_is_invalid() {
        let svc = service();
        let token = svc.issue_access_token(42).unwrap();
        let forged_payload = sign_raw(
            json!({ "sub": "1", "kind": "access", "exp": Utc::now().timestamp() + 3600, "iat": 0 }),
            Algorithm::HS256,
            "attacker-key",
        );

        // Original header and signature, attacker's payload.
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged_payload.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert_eq!(svc.validate(&spliced, TokenKind::Access), Err(TokenError::InvalidToken));
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(
            service().validate("invalid.token.here", TokenKind::Access),
            Err(TokenError::InvalidToken)
        );
    }

    #[test]
    fn other_hmac_algorithms_are_rejected() {
        let token = sign_raw(
            json!({ "sub": "42", "kind": "access", "exp": Utc::now().timestamp() + 3600 }),
            Algorithm::HS512,
            TEST_SECRET,
        );
        assert_eq!(service().validate(&token, TokenKind::Access), Err(TokenError::InvalidToken));
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let svc = service();
        let refresh = svc.issue_refresh_token(42).unwrap();
        let reset = svc.issue_reset_token(42).unwrap();

        assert_eq!(svc.validate(&refresh, TokenKind::Access), Err(TokenError::InvalidToken));
        assert_eq!(svc.validate(&reset, TokenKind::Access), Err(TokenError::InvalidToken));
        assert_eq!(svc.validate(&refresh, TokenKind::Refresh), Ok(Identity { user_id: 42 }));
    }

    #[test]
    fn missing_or_non_numeric_subject_is_malformed() {
        let exp = Utc::now().timestamp() + 3600;
        let no_sub = sign_raw(json!({ "kind": "access", "exp": exp }), Algorithm::HS256, TEST_SECRET);
        let text_sub = sign_raw(
            json!({ "sub": "alice", "kind": "access", "exp": exp }),
            Algorithm::HS256,
            TEST_SECRET,
        );

        let svc = service();
        assert_eq!(svc.validate(&no_sub, TokenKind::Access), Err(TokenError::MalformedClaims));
        assert_eq!(svc.validate(&text_sub, TokenKind::Access), Err(TokenError::MalformedClaims));
    }

    #[test]
    fn numeric_subject_is_accepted() {
        let token = sign_raw(
            json!({ "sub": 42, "kind": "access", "exp": Utc::now().timestamp() + 3600 }),
            Algorithm::HS256,
            TEST_SECRET,
        );
        assert_eq!(service().validate(&token, TokenKind::Access), Ok(Identity { user_id: 42 }));
    }

    #[test]
    fn pair_carries_access_lifetime() {
        let pair = service().issue_pair(9).unwrap();
        assert_eq!(pair.expires_in, 3600);
        assert_eq!(pair.token_type, "Bearer");
        assert_ne!(pair.access_token, pair.refresh_token);
    }
}
