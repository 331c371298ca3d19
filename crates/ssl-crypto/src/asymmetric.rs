//! # Asymmetric Wrapping
//!
//! RSA with PKCS#1 v1.5 padding, used only to wrap small per-exchange
//! secrets (signature key, session key + IV) for the gateway.
//!
//! Keys are read from PEM text. Stored key text may carry literal `\n`
//! escape sequences instead of line breaks; [`normalize_key_text`] fixes that
//! before parsing.

use crate::cipher::{Algorithm, Decryptor, Encryptor};
use crate::CryptoError;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

/// PKCS#1 v1.5 encryption overhead in bytes.
const PKCS1_OVERHEAD: usize = 11;

/// Replace literal `\n` escapes with real newlines and trim surrounding whitespace.
pub fn normalize_key_text(text: &str) -> String {
    text.replace("\\n", "\n").trim().to_string()
}

/// Public half: wraps secrets for the gateway.
#[derive(Clone)]
pub struct RsaPublicCipher {
    key: RsaPublicKey,
}

impl RsaPublicCipher {
    /// Parse an SPKI (`BEGIN PUBLIC KEY`) or PKCS#1 (`BEGIN RSA PUBLIC KEY`) PEM.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidPublicKey` if the text is not a valid RSA public key.
    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        let pem = normalize_key_text(pem);
        let key = if pem.contains("BEGIN RSA PUBLIC KEY") {
            RsaPublicKey::from_pkcs1_pem(&pem)
                .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?
        } else {
            RsaPublicKey::from_public_key_pem(&pem)
                .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?
        };
        Ok(Self { key })
    }

    /// Largest plaintext this key can wrap.
    pub fn max_plaintext_len(&self) -> usize {
        self.key.size().saturating_sub(PKCS1_OVERHEAD)
    }
}

impl Encryptor for RsaPublicCipher {
    fn algorithm(&self) -> Algorithm {
        Algorithm::RsaPkcs1
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.key
            .encrypt(&mut rand::thread_rng(), Pkcs1v15Encrypt, plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
    }
}

impl std::fmt::Debug for RsaPublicCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaPublicCipher")
            .field("bits", &(self.key.size() * 8))
            .finish()
    }
}

/// Private half: unwraps secrets on the gateway.
#[derive(Clone)]
pub struct RsaPrivateCipher {
    key: RsaPrivateKey,
}

impl RsaPrivateCipher {
    /// Parse a PKCS#1 (`BEGIN RSA PRIVATE KEY`) or PKCS#8 (`BEGIN PRIVATE KEY`) PEM.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidPrivateKey` if the text is not a valid RSA private key.
    pub fn from_pem(pem: &str) -> Result<Self, CryptoError> {
        let pem = normalize_key_text(pem);
        let key = if pem.contains("BEGIN RSA PRIVATE KEY") {
            RsaPrivateKey::from_pkcs1_pem(&pem)
                .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?
        } else {
            RsaPrivateKey::from_pkcs8_pem(&pem)
                .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?
        };
        Ok(Self { key })
    }

    /// Matching public cipher.
    pub fn public_cipher(&self) -> RsaPublicCipher {
        RsaPublicCipher {
            key: self.key.to_public_key(),
        }
    }
}

impl Decryptor for RsaPrivateCipher {
    fn algorithm(&self) -> Algorithm {
        Algorithm::RsaPkcs1
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.key
            .decrypt(Pkcs1v15Encrypt, ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
    }
}

impl std::fmt::Debug for RsaPrivateCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaPrivateCipher")
            .field("bits", &(self.key.size() * 8))
            .finish_non_exhaustive()
    }
}
