//! Envelope rejection taxonomy.
//!
//! Every variant is a rejection of one exchange. None is retried by this
//! layer; the gateway turns them into `401` responses and the client logs
//! them and aborts the call.

use ssl_crypto::CryptoError;
use thiserror::Error;

/// Why an envelope was rejected.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// A required envelope header is absent
    #[error("Missing {0} header")]
    MissingHeader(String),

    /// Timestamp is older than the freshness window (or unparseable)
    #[error("Timestamp expired")]
    TimestampExpired,

    /// Signature header is present but empty
    #[error("Invalid signature")]
    InvalidSignature,

    /// The gateway could not obtain its RSA private key
    #[error("RSA private key unavailable")]
    KeyUnavailable,

    /// Wrapped signature key did not unwrap to a usable secret
    #[error("Invalid signature key")]
    InvalidSignatureKey,

    /// Recomputed signature differs from the presented one
    #[error("Signature verification failed")]
    SignatureMismatch,

    /// Wrapped security key did not unwrap to `<key>||<iv>`
    #[error("Invalid security key")]
    InvalidSecurityKey,

    /// Body could not be decrypted with the session key
    #[error("Body decryption failed")]
    DecryptionFailure,

    /// Response carried a non-2xx status; the body is left as sent
    #[error("Response error status {status}")]
    UnsuccessfulStatus {
        /// HTTP status code of the response
        status: u16,
        /// Plaintext body as returned by the gateway
        body: String,
    },

    /// Sealing failed on the sending side
    #[error("Envelope sealing failed: {0}")]
    Crypto(#[from] CryptoError),

    /// A computed header value was not a valid HTTP header value
    #[error("Invalid header value: {0}")]
    HeaderEncoding(String),
}

impl EnvelopeError {
    /// Stable machine-readable name of the rejection.
    pub fn kind(&self) -> &'static str {
        match self {
            EnvelopeError::MissingHeader(_) => "MissingHeader",
            EnvelopeError::TimestampExpired => "TimestampExpired",
            EnvelopeError::InvalidSignature => "InvalidSignature",
            EnvelopeError::KeyUnavailable => "KeyUnavailable",
            EnvelopeError::InvalidSignatureKey => "InvalidSignatureKey",
            EnvelopeError::SignatureMismatch => "SignatureMismatch",
            EnvelopeError::InvalidSecurityKey => "InvalidSecurityKey",
            EnvelopeError::DecryptionFailure => "DecryptionFailure",
            EnvelopeError::UnsuccessfulStatus { .. } => "UnsuccessfulStatus",
            EnvelopeError::Crypto(_) => "Crypto",
            EnvelopeError::HeaderEncoding(_) => "HeaderEncoding",
        }
    }
}

impl From<http::header::InvalidHeaderValue> for EnvelopeError {
    fn from(e: http::header::InvalidHeaderValue) -> Self {
        EnvelopeError::HeaderEncoding(e.to_string())
    }
}
