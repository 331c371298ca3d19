//! # Primitive Traits
//!
//! One trait per transform. Concrete strategies live in [`crate::symmetric`],
//! [`crate::asymmetric`] and [`crate::mac`]; callers pick one explicitly.

use crate::CryptoError;
use std::fmt;

/// Fixed algorithm identifiers used by the envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    /// RSA with PKCS#1 v1.5 padding
    RsaPkcs1,
    /// AES-128 in CBC mode with PKCS#5 padding
    Aes128CbcPkcs5,
    /// HMAC over SHA-256
    HmacSha256,
}

impl Algorithm {
    /// Canonical name of the transform.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::RsaPkcs1 => "RSA/ECB/PKCS1Padding",
            Algorithm::Aes128CbcPkcs5 => "AES/CBC/PKCS5Padding",
            Algorithm::HmacSha256 => "HMAC-SHA256",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Forward transform of a cipher.
pub trait Encryptor: Send + Sync {
    /// Algorithm implemented by this strategy.
    fn algorithm(&self) -> Algorithm;

    /// Encrypt raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::EncryptionFailed` if the transform rejects the input.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// Inverse transform of a cipher.
pub trait Decryptor: Send + Sync {
    /// Algorithm implemented by this strategy.
    fn algorithm(&self) -> Algorithm;

    /// Decrypt raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::DecryptionFailed` on malformed input or key mismatch.
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// Keyed digest (MAC).
pub trait KeyedHasher: Send + Sync {
    /// Algorithm implemented by this strategy.
    fn algorithm(&self) -> Algorithm;

    /// Compute the digest of `data`.
    fn digest(&self, data: &[u8]) -> Vec<u8>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_names() {
        assert_eq!(Algorithm::RsaPkcs1.to_string(), "RSA/ECB/PKCS1Padding");
        assert_eq!(Algorithm::Aes128CbcPkcs5.to_string(), "AES/CBC/PKCS5Padding");
        assert_eq!(Algorithm::HmacSha256.to_string(), "HMAC-SHA256");
    }
}
