use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a signed token may be used for. Kinds are not interchangeable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    PasswordReset,
}

/// Claims written into every token we sign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // numeric user id, decimal
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
}

/// Claims as read back from an untrusted token: `sub` is checked by hand so
/// that a missing or non-numeric subject is told apart from a bad signature.
#[derive(Debug, Deserialize)]
pub struct RawClaims {
    #[serde(default)]
    pub sub: Option<Value>,
    pub kind: TokenKind,
    pub exp: i64,
}

/// The verified caller, bound to the request by the authentication stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i32,
}

impl Identity {
    /// Accepts every numeric representation a subject may arrive in:
    /// JSON integers, integral floats and decimal strings.
    pub fn from_subject(value: &Value) -> Option<Self> {
        let user_id = match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i32::try_from(i).ok()?
                } else {
                    let f = n.as_f64()?;
                    if f.fract() != 0.0 || f < i32::MIN as f64 || f > i32::MAX as f64 {
                        return None;
                    }
                    f as i32
                }
            }
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        Some(Self { user_id })
    }
}

/// Access + refresh token pair handed out at login, refresh and OAuth.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub token_type: &'static str,
}
