//! # Text Boundary
//!
//! Strings go in as UTF-8 bytes and come out base64-encoded so they can
//! travel in HTTP headers and bodies.
//!
//! Empty or whitespace-only input is a no-op: the underlying transform is
//! never invoked.

use crate::cipher::{Decryptor, Encryptor, KeyedHasher};
use crate::CryptoError;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Encrypt `plaintext` and base64-encode the result.
///
/// Returns `Ok(None)` for empty or whitespace-only input.
///
/// # Errors
///
/// Propagates the cipher's `CryptoError`.
pub fn encrypt_text<E: Encryptor + ?Sized>(
    cipher: &E,
    plaintext: &str,
) -> Result<Option<String>, CryptoError> {
    if plaintext.trim().is_empty() {
        return Ok(None);
    }
    let ciphertext = cipher.encrypt(plaintext.as_bytes())?;
    Ok(Some(STANDARD.encode(ciphertext)))
}

/// Base64-decode `encoded` and decrypt it back to a UTF-8 string.
///
/// Returns an empty string for empty or whitespace-only input.
///
/// # Errors
///
/// `InvalidEncoding` for bad base64, the cipher's error for a failed
/// transform, `InvalidUtf8` when the plaintext is not UTF-8.
pub fn decrypt_text<D: Decryptor + ?Sized>(
    cipher: &D,
    encoded: &str,
) -> Result<String, CryptoError> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Ok(String::new());
    }
    let ciphertext = STANDARD.decode(encoded)?;
    let plaintext = cipher.decrypt(&ciphertext)?;
    String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
}

/// Keyed digest of `message`, base64-encoded.
///
/// Returns `None` for empty or whitespace-only input.
pub fn sign_text<H: KeyedHasher + ?Sized>(hasher: &H, message: &str) -> Option<String> {
    if message.trim().is_empty() {
        return None;
    }
    Some(STANDARD.encode(hasher.digest(message.as_bytes())))
}
