//! Per-exchange secrets.
//!
//! Both secrets are alphanumeric text. Their UTF-8 bytes are the raw key
//! material, and the alphabet guarantees the `||` separator never appears
//! inside a part.

use crate::config::SECURITY_KEY_SEPARATOR;
use crate::error::EnvelopeError;
use rand::distributions::Alphanumeric;
use rand::Rng;
use ssl_crypto::{Aes128CbcCipher, HmacSha256, AES_IV_LEN, AES_KEY_LEN};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of a generated signature key in characters.
pub const SIGNATURE_KEY_LEN: usize = 32;

fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// HMAC key for one request and its response.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SignatureKey(String);

impl SignatureKey {
    /// Fresh random key.
    pub fn generate() -> Self {
        Self(random_alphanumeric(SIGNATURE_KEY_LEN))
    }

    /// Key recovered from an unwrapped header. Blank input is rejected.
    pub fn from_unwrapped(bytes: Vec<u8>) -> Result<Self, EnvelopeError> {
        let text = String::from_utf8(bytes).map_err(|_| EnvelopeError::InvalidSignatureKey)?;
        if text.trim().is_empty() {
            return Err(EnvelopeError::InvalidSignatureKey);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn hasher(&self) -> HmacSha256 {
        HmacSha256::new(self.0.as_bytes())
    }
}

impl std::fmt::Debug for SignatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SignatureKey(..)")
    }
}

/// AES-128 key and IV, each 16 characters.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    key: String,
    iv: String,
}

impl SessionKey {
    /// Fresh random key and IV.
    pub fn generate() -> Self {
        Self {
            key: random_alphanumeric(AES_KEY_LEN),
            iv: random_alphanumeric(AES_IV_LEN),
        }
    }

    /// Wire form: `<key>||<iv>`.
    pub fn to_security_key_string(&self) -> String {
        format!("{}{}{}", self.key, SECURITY_KEY_SEPARATOR, self.iv)
    }

    /// Parse the unwrapped `X-SSL-SecurityKey` plaintext.
    ///
    /// Exactly two non-empty parts of exactly 16 bytes each, otherwise
    /// [`EnvelopeError::InvalidSecurityKey`].
    pub fn parse(text: &str) -> Result<Self, EnvelopeError> {
        let mut parts = text.split(SECURITY_KEY_SEPARATOR);
        let (Some(key), Some(iv), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(EnvelopeError::InvalidSecurityKey);
        };
        if key.len() != AES_KEY_LEN || iv.len() != AES_IV_LEN {
            return Err(EnvelopeError::InvalidSecurityKey);
        }
        Ok(Self {
            key: key.to_string(),
            iv: iv.to_string(),
        })
    }

    /// Session cipher for bodies.
    pub fn cipher(&self) -> Result<Aes128CbcCipher, EnvelopeError> {
        Ok(Aes128CbcCipher::from_slices(
            self.key.as_bytes(),
            self.iv.as_bytes(),
        )?)
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// Secrets of one exchange, kept by the builder to check the response and
/// recovered by the gateway from the request headers.
#[derive(Debug, Clone)]
pub struct ExchangeSecrets {
    pub signature_key: SignatureKey,
    pub session_key: SessionKey,
}

impl ExchangeSecrets {
    pub fn generate() -> Self {
        Self {
            signature_key: SignatureKey::generate(),
            session_key: SessionKey::generate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssl_crypto::{decrypt_text, encrypt_text};

    #[test]
    fn test_generated_shapes() {
        let signature_key = SignatureKey::generate();
        assert_eq!(signature_key.as_str().len(), SIGNATURE_KEY_LEN);
        assert!(signature_key.as_str().chars().all(|c| c.is_ascii_alphanumeric()));

        let session = SessionKey::generate();
        let wire = session.to_security_key_string();
        assert_eq!(wire.len(), 16 + 2 + 16);
        assert_eq!(wire.matches("||").count(), 1);
    }

    #[test]
    fn test_generated_keys_differ() {
        assert_ne!(SignatureKey::generate(), SignatureKey::generate());
        assert_ne!(SessionKey::generate(), SessionKey::generate());
    }

    #[test]
    fn test_parse_roundtrip() {
        let session = SessionKey::generate();
        let parsed = SessionKey::parse(&session.to_security_key_string()).unwrap();
        assert_eq!(parsed, session);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let bad = [
            "",
            "0123456789abcdef",
            "0123456789abcdef||",
            "||0123456789abcdef",
            "0123456789abcdef||0123456789abcde",
            "0123456789abcdef||0123456789abcdefg",
            "0123456789abcdef||0123456789abcdef||0123456789abcdef",
            "0123456789abcdef|0123456789abcdef",
        ];
        for text in bad {
            assert!(
                matches!(SessionKey::parse(text), Err(EnvelopeError::InvalidSecurityKey)),
                "accepted {text:?}"
            );
        }
    }

    #[test]
    fn test_session_cipher_roundtrip() {
        let session = SessionKey::parse("0123456789abcdef||fedcba9876543210").unwrap();
        let cipher = session.cipher().unwrap();
        let encoded = encrypt_text(&cipher, "{\"Name\":\"prefix\",\"Value\":10}")
            .unwrap()
            .unwrap();
        assert_eq!(
            decrypt_text(&cipher, &encoded).unwrap(),
            "{\"Name\":\"prefix\",\"Value\":10}"
        );
    }

    #[test]
    fn test_signature_key_from_unwrapped() {
        assert!(SignatureKey::from_unwrapped(b"abc".to_vec()).is_ok());
        assert!(matches!(
            SignatureKey::from_unwrapped(b" \t\n".to_vec()),
            Err(EnvelopeError::InvalidSignatureKey)
        ));
        assert!(matches!(
            SignatureKey::from_unwrapped(Vec::new()),
            Err(EnvelopeError::InvalidSignatureKey)
        ));
        assert!(matches!(
            SignatureKey::from_unwrapped(vec![0xff, 0xfe]),
            Err(EnvelopeError::InvalidSignatureKey)
        ));
    }

    #[test]
    fn test_debug_hides_material() {
        let secrets = ExchangeSecrets::generate();
        let rendered = format!("{secrets:?}");
        assert!(!rendered.contains(secrets.signature_key.as_str()));
    }
}
