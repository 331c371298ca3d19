//! Client side of the envelope: seal requests, open responses.

use crate::config::EnvelopeConfig;
use crate::error::EnvelopeError;
use crate::keys::ExchangeSecrets;
use crate::signing::{canonical_request, canonical_response, sign, verify};
use crate::timestamp::{is_stale, SystemTimeSource, TimeSource};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use ssl_crypto::{decrypt_text, encrypt_text, RsaPublicCipher};
use std::sync::Arc;
use tracing::{debug, warn};

/// A request ready to send.
#[derive(Debug)]
pub struct SealedRequest {
    /// The four envelope headers
    pub headers: HeaderMap,
    /// Encrypted body, or the caller's body untouched when it was blank
    pub body: Option<String>,
    /// Secrets needed to check the matching response
    pub secrets: ExchangeSecrets,
    /// Timestamp the request was signed with
    pub timestamp: u64,
}

/// Seals requests for one gateway public key.
#[derive(Clone)]
pub struct EnvelopeBuilder {
    config: EnvelopeConfig,
    gateway_key: RsaPublicCipher,
    clock: Arc<dyn TimeSource>,
}

impl EnvelopeBuilder {
    pub fn new(config: EnvelopeConfig, gateway_key: RsaPublicCipher) -> Self {
        Self::with_time_source(config, gateway_key, Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(
        config: EnvelopeConfig,
        gateway_key: RsaPublicCipher,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            config,
            gateway_key,
            clock,
        }
    }

    pub fn config(&self) -> &EnvelopeConfig {
        &self.config
    }

    /// Generate fresh secrets, sign, wrap and encrypt.
    ///
    /// `path` is the absolute request path; a query string, if present, is
    /// not part of the signature.
    pub fn build_request(
        &self,
        method: &Method,
        path: &str,
        body: Option<&str>,
    ) -> Result<SealedRequest, EnvelopeError> {
        let secrets = ExchangeSecrets::generate();
        let timestamp = self.clock.now_millis();
        let timestamp_text = timestamp.to_string();

        let path = path.split('?').next().unwrap_or(path);
        let signature = sign(
            &secrets.signature_key,
            &canonical_request(method, path, &timestamp_text),
        );

        let wrapped_signature_key =
            encrypt_text(&self.gateway_key, secrets.signature_key.as_str())?
                .ok_or(EnvelopeError::InvalidSignatureKey)?;
        let wrapped_security_key = encrypt_text(
            &self.gateway_key,
            &secrets.session_key.to_security_key_string(),
        )?
        .ok_or(EnvelopeError::InvalidSecurityKey)?;

        let body = match body {
            Some(text) if !text.trim().is_empty() => {
                encrypt_text(&secrets.session_key.cipher()?, text)?
            }
            other => other.map(str::to_string),
        };

        let names = &self.config.headers;
        let mut headers = HeaderMap::with_capacity(4);
        headers.insert(names.timestamp.clone(), HeaderValue::from_str(&timestamp_text)?);
        headers.insert(names.signature.clone(), HeaderValue::from_str(&signature)?);
        headers.insert(
            names.signature_key.clone(),
            HeaderValue::from_str(&wrapped_signature_key)?,
        );
        headers.insert(
            names.security_key.clone(),
            HeaderValue::from_str(&wrapped_security_key)?,
        );

        debug!(method = %method, path, timestamp, "Sealed request");

        Ok(SealedRequest {
            headers,
            body,
            secrets,
            timestamp,
        })
    }

    /// Check a response against the secrets of its request and decrypt it.
    ///
    /// Order: headers present, timestamp fresh, signature non-empty,
    /// signature matches, status successful, body decrypts. The first
    /// failure is returned.
    pub fn verify_response(
        &self,
        status: StatusCode,
        headers: &HeaderMap,
        body: &str,
        secrets: &ExchangeSecrets,
    ) -> Result<String, EnvelopeError> {
        self.check_response(status, headers, body, secrets)
            .inspect_err(|e| {
                warn!(status = status.as_u16(), reason = e.kind(), error = %e, "Response rejected");
            })
    }

    fn check_response(
        &self,
        status: StatusCode,
        headers: &HeaderMap,
        body: &str,
        secrets: &ExchangeSecrets,
    ) -> Result<String, EnvelopeError> {
        let names = &self.config.headers;
        let timestamp = required(headers, &names.timestamp)?;
        let signature = required(headers, &names.signature)?;

        if is_stale(timestamp, self.clock.now_millis(), self.config.freshness_window) {
            return Err(EnvelopeError::TimestampExpired);
        }
        if signature.trim().is_empty() {
            return Err(EnvelopeError::InvalidSignature);
        }
        if !verify(
            &secrets.signature_key,
            &canonical_response(status, timestamp),
            signature,
        ) {
            return Err(EnvelopeError::SignatureMismatch);
        }
        if !status.is_success() {
            return Err(EnvelopeError::UnsuccessfulStatus {
                status: status.as_u16(),
                body: body.to_string(),
            });
        }

        let cipher = secrets
            .session_key
            .cipher()
            .map_err(|_| EnvelopeError::DecryptionFailure)?;
        decrypt_text(&cipher, body).map_err(|_| EnvelopeError::DecryptionFailure)
    }
}

impl std::fmt::Debug for EnvelopeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeBuilder")
            .field("config", &self.config)
            .field("gateway_key", &self.gateway_key)
            .finish_non_exhaustive()
    }
}

/// Header text, or `MissingHeader`. Non-ASCII values read as empty.
pub(crate) fn required<'a>(
    headers: &'a HeaderMap,
    name: &HeaderName,
) -> Result<&'a str, EnvelopeError> {
    headers
        .get(name)
        .map(|value| value.to_str().unwrap_or(""))
        .ok_or_else(|| EnvelopeError::MissingHeader(name.as_str().to_string()))
}
