//! Gateway side of the envelope: open requests, seal responses.
//!
//! The opener holds no key material. The caller obtains the RSA private key
//! between [`EnvelopeOpener::inspect`] and [`EnvelopeOpener::unwrap_secrets`]
//! so that a request with bad headers never touches the key repository.

use crate::builder::required;
use crate::config::EnvelopeConfig;
use crate::error::EnvelopeError;
use crate::keys::{ExchangeSecrets, SessionKey, SignatureKey};
use crate::signing::{canonical_request, canonical_response, sign, verify};
use crate::timestamp::{is_stale, SystemTimeSource, TimeSource};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use ssl_crypto::{decrypt_text, encrypt_text, RsaPrivateCipher};
use std::sync::Arc;
use tracing::debug;

/// Envelope header values of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeHeaders {
    pub timestamp: String,
    pub security_key: String,
    pub signature_key: String,
    pub signature: String,
}

#[derive(Clone)]
pub struct EnvelopeOpener {
    config: EnvelopeConfig,
    clock: Arc<dyn TimeSource>,
}

impl EnvelopeOpener {
    pub fn new(config: EnvelopeConfig) -> Self {
        Self::with_time_source(config, Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(config: EnvelopeConfig, clock: Arc<dyn TimeSource>) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &EnvelopeConfig {
        &self.config
    }

    /// Header presence, timestamp freshness and a non-empty signature.
    pub fn inspect(&self, headers: &HeaderMap) -> Result<EnvelopeHeaders, EnvelopeError> {
        let names = &self.config.headers;
        let envelope = EnvelopeHeaders {
            timestamp: required(headers, &names.timestamp)?.to_string(),
            security_key: required(headers, &names.security_key)?.to_string(),
            signature_key: required(headers, &names.signature_key)?.to_string(),
            signature: required(headers, &names.signature)?.to_string(),
        };

        if is_stale(
            &envelope.timestamp,
            self.clock.now_millis(),
            self.config.freshness_window,
        ) {
            return Err(EnvelopeError::TimestampExpired);
        }
        if envelope.signature.trim().is_empty() {
            return Err(EnvelopeError::InvalidSignature);
        }
        Ok(envelope)
    }

    /// Unwrap the signature key, check the request signature, then unwrap
    /// the session key.
    pub fn unwrap_secrets(
        &self,
        private_key: &RsaPrivateCipher,
        method: &Method,
        path: &str,
        envelope: &EnvelopeHeaders,
    ) -> Result<ExchangeSecrets, EnvelopeError> {
        let signature_key = decrypt_text(private_key, &envelope.signature_key)
            .map_err(|_| EnvelopeError::InvalidSignatureKey)
            .and_then(|text| SignatureKey::from_unwrapped(text.into_bytes()))?;

        let source = canonical_request(method, path, &envelope.timestamp);
        if !verify(&signature_key, &source, &envelope.signature) {
            return Err(EnvelopeError::SignatureMismatch);
        }

        let security_key = decrypt_text(private_key, &envelope.security_key)
            .map_err(|_| EnvelopeError::InvalidSecurityKey)?;
        let session_key = SessionKey::parse(&security_key)?;

        debug!(method = %method, path, "Envelope secrets recovered");
        Ok(ExchangeSecrets {
            signature_key,
            session_key,
        })
    }

    /// Decrypt a request body. Blank input yields an empty string.
    pub fn open_body(
        &self,
        secrets: &ExchangeSecrets,
        body: &str,
    ) -> Result<String, EnvelopeError> {
        let cipher = secrets
            .session_key
            .cipher()
            .map_err(|_| EnvelopeError::DecryptionFailure)?;
        decrypt_text(&cipher, body).map_err(|_| EnvelopeError::DecryptionFailure)
    }

    /// Remove the four envelope headers.
    pub fn strip_headers(&self, headers: &mut HeaderMap) {
        for name in self.config.headers.all() {
            headers.remove(name);
        }
    }

    /// Stamp a fresh timestamp and a status signature on a response, and
    /// encrypt its body when the status is successful.
    ///
    /// Returns the encrypted body, or `None` when the body goes out as is.
    pub fn seal_response(
        &self,
        status: StatusCode,
        headers: &mut HeaderMap,
        body: &str,
        secrets: &ExchangeSecrets,
    ) -> Result<Option<String>, EnvelopeError> {
        let sealed_body = if status.is_success() {
            encrypt_text(&secrets.session_key.cipher()?, body)?
        } else {
            None
        };

        let timestamp = self.clock.now_millis().to_string();
        let signature = sign(
            &secrets.signature_key,
            &canonical_response(status, &timestamp),
        );
        let names = &self.config.headers;
        headers.insert(names.timestamp.clone(), HeaderValue::from_str(&timestamp)?);
        headers.insert(names.signature.clone(), HeaderValue::from_str(&signature)?);

        Ok(sealed_body)
    }
}

impl std::fmt::Debug for EnvelopeOpener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeOpener")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
