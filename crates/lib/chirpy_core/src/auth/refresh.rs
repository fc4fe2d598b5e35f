//! Opaque refresh token generation and hashing.

use rand::{Rng, rng};
use sha2::{Digest, Sha256};

/// Refresh token lifetime: 60 days.
pub const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 60;

/// Number of random bytes in a refresh token (256 bits).
const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a cryptographically random refresh token, hex-encoded (64 chars).
pub fn generate_refresh_token() -> String {
    let bytes: [u8; REFRESH_TOKEN_BYTES] = rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// SHA-256 hash a refresh token for storage.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_64_hex_chars() {
        let token = generate_refresh_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_do_not_repeat() {
        assert_ne!(generate_refresh_token(), generate_refresh_token());
    }

    #[test]
    fn hash_is_stable_and_differs_from_token() {
        let token = generate_refresh_token();
        assert_eq!(hash_refresh_token(&token), hash_refresh_token(&token));
        assert_ne!(hash_refresh_token(&token), token);
    }
}
