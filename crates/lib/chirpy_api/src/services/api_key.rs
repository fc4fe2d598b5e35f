//! Static shared-secret comparison for server-to-server callers.

use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

/// Compare a presented key against the configured one in constant time.
///
/// An empty configured key matches nothing, so an unset `POLKA_KEY` closes
/// the webhook instead of opening it.
pub fn api_key_matches(expected: &SecretString, provided: &str) -> bool {
    let expected = expected.expose_secret();
    if expected.is_empty() {
        return false;
    }
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}
