//! Shared-secret bearer authentication

use axum::http::HeaderMap;

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Check the presented bearer token against the configured secret.
///
/// A missing configured secret rejects everything.
pub fn verify_bearer(headers: &HeaderMap, expected: Option<&str>) -> bool {
    match (bearer_token(headers), expected) {
        (Some(token), Some(expected)) => constant_time_eq(token.as_bytes(), expected.as_bytes()),
        _ => false,
    }
}

/// Compare without short-circuiting on the first differing byte
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
