//! Stateless CSRF token issuance and verification.

use axum::http::HeaderMap;
use rand::RngCore;
use subtle::ConstantTimeEq;

pub const CSRF_HEADER_NAME: &str = "x-csrf-token";
pub const CSRF_TOKEN_BYTES: usize = 32;

/// Returns 32 bytes from the OS-seeded CSPRNG, hex encoded (64 characters).
pub fn generate_token() -> String {
    let mut bytes = [0u8; CSRF_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Compares `token` with `expected` without an early exit on the first differing byte.
///
/// Empty inputs and length mismatches are rejected up front; length is not secret.
pub fn validate_token(token: &str, expected: &str) -> bool {
    if token.is_empty() || expected.is_empty() || token.len() != expected.len() {
        return false;
    }
    token.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Reads the CSRF header. No fallback to other headers or the body.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CSRF_HEADER_NAME)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}
