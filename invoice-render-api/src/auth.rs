//! Request credential gate.
//!
//! Stateless check of the caller's `x-api-key` header against the configured
//! secret. The request is unauthorized when no secret is configured, the
//! configured secret is empty, the header is missing, or the values differ.

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Authorized,
    Unauthorized,
}

/// Compare the caller-supplied credential against the configured secret
pub fn verify(secret: Option<&str>, provided: Option<&str>) -> AuthDecision {
    let secret = match secret {
        Some(s) if !s.is_empty() => s,
        _ => return AuthDecision::Unauthorized,
    };
    let provided = match provided {
        Some(p) => p,
        None => return AuthDecision::Unauthorized,
    };
    if constant_time_eq(secret.as_bytes(), provided.as_bytes()) {
        AuthDecision::Authorized
    } else {
        AuthDecision::Unauthorized
    }
}

/// Equality over the full length of both inputs; only the length check can
/// exit early.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
