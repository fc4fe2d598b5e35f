//! Password hashing via bcrypt.

use std::sync::LazyLock;

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Throwaway digest at the same cost as real ones, built on first use.
static PLACEHOLDER_DIGEST: LazyLock<Option<String>> =
    LazyLock::new(|| bcrypt::hash("chirpy-placeholder", BCRYPT_COST).ok());

/// Hash a password with bcrypt (cost 10). Each call draws a fresh salt, so
/// two hashes of the same password differ; compare with [`verify_password`].
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|e| AuthError::Hashing(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
///
/// Returns `PasswordMismatch` for a wrong password and `MalformedDigest` when
/// the stored hash cannot be parsed at all.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    match bcrypt::verify(password, hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::PasswordMismatch),
        Err(e) => Err(AuthError::MalformedDigest(format!("bcrypt verify: {e}"))),
    }
}

/// Run one full bcrypt verification against a throwaway digest and discard
/// the result. Login calls this for unknown accounts so they cost the same
/// as a wrong password.
pub fn verify_placeholder(password: &str) {
    if let Some(digest) = PLACEHOLDER_DIGEST.as_deref() {
        let _ = bcrypt::verify(password, digest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_succeeds() {
        let hash = hash_password("password123").unwrap();
        assert!(verify_password("password123", &hash).is_ok());
    }

    #[test]
    fn wrong_password_is_a_mismatch() {
        let hash = hash_password("password123").unwrap();
        assert!(matches!(
            verify_password("wrongpassword", &hash),
            Err(AuthError::PasswordMismatch)
        ));
    }

    #[test]
    fn empty_password_round_trips() {
        let hash = hash_password("").unwrap();
        assert!(verify_password("", &hash).is_ok());
        assert!(verify_password(" ", &hash).is_err());
    }

    #[test]
    fn invalid_hash_is_malformed() {
        assert!(matches!(
            verify_password("password123", "invalidhash"),
            Err(AuthError::MalformedDigest(_))
        ));
    }

    #[test]
    fn placeholder_digest_is_a_real_bcrypt_hash() {
        let digest = PLACEHOLDER_DIGEST.as_deref().expect("placeholder digest");
        assert!(digest.starts_with("$2b$10$"));
        // A well-formed digest yields a mismatch, never MalformedDigest, so
        // the full key schedule runs.
        assert!(matches!(
            verify_password("whatever", digest),
            Err(AuthError::PasswordMismatch)
        ));
        verify_placeholder("whatever");
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same", &a).is_ok());
        assert!(verify_password("same", &b).is_ok());
    }
}
