//! # Keyed Hashing
//!
//! HMAC-SHA256 keyed by an arbitrary-length secret.

use crate::cipher::{Algorithm, KeyedHasher};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256Impl = Hmac<Sha256>;

/// HMAC-SHA256 digest length in bytes.
pub const HMAC_SHA256_LEN: usize = 32;

/// HMAC-SHA256 keyed hasher.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HmacSha256 {
    key: Vec<u8>,
}

impl HmacSha256 {
    /// Create from key bytes. HMAC accepts keys of any length.
    pub fn new(key: &[u8]) -> Self {
        Self { key: key.to_vec() }
    }
}

impl KeyedHasher for HmacSha256 {
    fn algorithm(&self) -> Algorithm {
        Algorithm::HmacSha256
    }

    fn digest(&self, data: &[u8]) -> Vec<u8> {
        // new_from_slice only fails for fixed-size-key MACs
        let Ok(mut mac) = HmacSha256Impl::new_from_slice(&self.key) else {
            return Vec::new();
        };
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

impl std::fmt::Debug for HmacSha256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSha256").finish_non_exhaustive()
    }
}
