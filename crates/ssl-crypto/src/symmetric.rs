//! # Symmetric Encryption
//!
//! AES-128 in CBC mode with PKCS#5 padding (PKCS#7 over 16-byte blocks,
//! which is byte-identical for AES).
//!
//! ## Security Properties
//!
//! - Unauthenticated mode: integrity comes from the envelope signature, not
//!   from the cipher.
//! - Key and IV are per-exchange and zeroized on drop.

use crate::cipher::{Algorithm, Decryptor, Encryptor};
use crate::CryptoError;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::{Zeroize, ZeroizeOnDrop};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// AES-128 key length in bytes.
pub const AES_KEY_LEN: usize = 16;

/// CBC initialization vector length in bytes.
pub const AES_IV_LEN: usize = 16;

/// AES-128-CBC cipher bound to one key and IV.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Aes128CbcCipher {
    key: [u8; AES_KEY_LEN],
    iv: [u8; AES_IV_LEN],
}

impl Aes128CbcCipher {
    /// Create from fixed-size key and IV.
    pub fn new(key: [u8; AES_KEY_LEN], iv: [u8; AES_IV_LEN]) -> Self {
        Self { key, iv }
    }

    /// Create from slices, checking both lengths.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidKeyLength` / `InvalidIvLength` when a slice
    /// is not exactly 16 bytes.
    pub fn from_slices(key: &[u8], iv: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; AES_KEY_LEN] =
            key.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: AES_KEY_LEN,
                actual: key.len(),
            })?;
        let iv: [u8; AES_IV_LEN] = iv.try_into().map_err(|_| CryptoError::InvalidIvLength {
            expected: AES_IV_LEN,
            actual: iv.len(),
        })?;
        Ok(Self::new(key, iv))
    }
}

impl Encryptor for Aes128CbcCipher {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Aes128CbcPkcs5
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let encryptor = Aes128CbcEnc::new_from_slices(&self.key, &self.iv)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
        Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
    }
}

impl Decryptor for Aes128CbcCipher {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Aes128CbcPkcs5
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let decryptor = Aes128CbcDec::new_from_slices(&self.key, &self.iv)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;
        decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
    }
}

impl std::fmt::Debug for Aes128CbcCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aes128CbcCipher").finish_non_exhaustive()
    }
}
