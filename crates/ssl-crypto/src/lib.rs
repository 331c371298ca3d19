//! # SSL Crypto - Envelope Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `asymmetric` | RSA / PKCS#1 v1.5 | Wrapping per-exchange secrets |
//! | `symmetric` | AES-128-CBC / PKCS#5 | HTTP body encryption |
//! | `mac` | HMAC-SHA256 | Request/response signatures |
//! | `text` | base64 over UTF-8 | Header/body transport encoding |
//!
//! Each primitive is a trait in [`cipher`] with one concrete strategy per
//! algorithm; callers select the strategy explicitly.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod asymmetric;
pub mod cipher;
pub mod errors;
pub mod mac;
pub mod symmetric;
pub mod text;

#[cfg(any(test, feature = "test-keys"))]
pub mod test_keys;

// Re-exports
pub use asymmetric::{normalize_key_text, RsaPrivateCipher, RsaPublicCipher};
pub use cipher::{Algorithm, Decryptor, Encryptor, KeyedHasher};
pub use errors::CryptoError;
pub use mac::HmacSha256;
pub use symmetric::{Aes128CbcCipher, AES_IV_LEN, AES_KEY_LEN};
pub use text::{decrypt_text, encrypt_text, sign_text};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
