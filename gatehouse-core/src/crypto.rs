//! Cryptographic utilities for secure token handling
//!
//! Single-use tokens (password reset, email verification) are stored as
//! SHA256 hashes and looked up by hash. For high-entropy tokens (256 bits
//! of randomness) SHA256 is sufficient; an adaptive hash is only needed
//! for low-entropy secrets like passwords.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Generate a cryptographically secure random token.
///
/// Produces a 256-bit random token encoded as URL-safe base64 (43 chars).
///
/// # Panics
///
/// Panics if the OS random number generator fails, which indicates a
/// critical system failure there is no recovering from for
/// security-sensitive operations.
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a token for storage using SHA256.
///
/// Deterministic, so the hash can double as the database lookup key.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    BASE64_URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secure_token() {
        let token = generate_secure_token();
        assert_eq!(token.len(), 43);
        assert_ne!(token, generate_secure_token());
    }

    #[test]
    fn test_hash_token_deterministic() {
        let token = generate_secure_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), hash_token("other"));
    }

}
