//! Canonical signature sources and HMAC signing.
//!
//! Request source: `"<METHOD> <path> <timestamp>"` with the method upper-cased
//! and the path taken without its query string.
//! Response source: `"<status> <timestamp>"`.
//!
//! The timestamp is the header text exactly as sent.

use crate::keys::SignatureKey;
use http::{Method, StatusCode};
use ssl_crypto::sign_text;

/// Signature source for a request.
pub fn canonical_request(method: &Method, path: &str, timestamp: &str) -> String {
    format!(
        "{} {} {}",
        method.as_str().to_ascii_uppercase(),
        path,
        timestamp
    )
}

/// Signature source for a response.
pub fn canonical_response(status: StatusCode, timestamp: &str) -> String {
    format!("{} {}", status.as_u16(), timestamp)
}

/// Base64 HMAC-SHA256 of `source`.
pub fn sign(key: &SignatureKey, source: &str) -> String {
    // sources always carry a method or status, so never blank
    sign_text(&key.hasher(), source).unwrap_or_default()
}

/// Recompute the signature over `source` and compare in constant time.
pub fn verify(key: &SignatureKey, source: &str, presented: &str) -> bool {
    let expected = sign(key, source);
    !expected.is_empty() && constant_time_compare(&expected, presented)
}

/// Constant-time string comparison.
///
/// Runs in time independent of how many bytes match. Lengths are compared
/// in constant time as well.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;

    let max_len = std::cmp::max(a.len(), b.len());

    // Different pad bytes so unequal lengths never compare equal
    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];

    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);

    (lengths_equal & contents_equal).into()
}
