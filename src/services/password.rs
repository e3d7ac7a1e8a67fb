//! Salted bcrypt hashing for stored credentials.

/// bcrypt only looks at the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password is longer than {MAX_PASSWORD_BYTES} bytes")]
    TooLong,
    #[error("stored hash is malformed: {0}")]
    MalformedHash(String),
    #[error("hashing failed: {0}")]
    Hashing(String),
}

/// Hash with a fresh salt at the given work factor.
///
/// Rejects inputs bcrypt would silently truncate.
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(PasswordError::TooLong);
    }
    bcrypt::hash(password, cost).map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// `Ok(false)` for any mismatch; `Err` only when the stored hash itself is
/// unusable. The comparison inside bcrypt is constant-time.
pub fn verify_password(hash: &str, candidate: &str) -> Result<bool, PasswordError> {
    if candidate.len() > MAX_PASSWORD_BYTES {
        // Could only match through truncation; still parse the hash so a
        // corrupt row is reported the same way regardless of input.
        bcrypt::verify("", hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
        return Ok(false);
    }
    bcrypt::verify(candidate, hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps the suite fast.
    const COST: u32 = 4;

    #[test]
    fn verifies_the_original_password() {
        let hash = hash_password("correct horse", COST).unwrap();
        assert!(verify_password(&hash, "correct horse").unwrap());
    }

    #[test]
    fn rejects_a_different_password() {
        let hash = hash_password("correct horse", COST).unwrap();
        assert!(!verify_password(&hash, "correct horsf").unwrap());
        assert!(!verify_password(&hash, "").unwrap());
    }

    #[test]
    fn salts_every_hash() {
        let a = hash_password("same", COST).unwrap();
        let b = hash_password("same", COST).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn refuses_passwords_bcrypt_would_truncate() {
        let long = "x".repeat(MAX_PASSWORD_BYTES + 1);
        assert!(matches!(hash_password(&long, COST), Err(PasswordError::TooLong)));
    }

    #[test]
    fn truncation_cannot_be_used_to_match() {
        let exact = "y".repeat(MAX_PASSWORD_BYTES);
        let hash = hash_password(&exact, COST).unwrap();
        let longer = format!("{exact}z");
        assert!(!verify_password(&hash, &longer).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error_not_a_mismatch() {
        assert!(matches!(
            verify_password("not-a-bcrypt-hash", "pw"),
            Err(PasswordError::MalformedHash(_))
        ));
    }
}
