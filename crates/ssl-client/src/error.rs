//! Client errors

use crate::config::ConfigError;
use ssl_crypto::CryptoError;
use ssl_envelope::EnvelopeError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Invalid client configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Request path could not be joined to the gateway address
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Transport failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway did not serve its public key
    #[error("public key unavailable (status {0})")]
    PublicKeyUnavailable(u16),

    /// The served or configured public key is unusable
    #[error("invalid gateway public key: {0}")]
    InvalidPublicKey(#[from] CryptoError),

    /// Envelope could not be built, or the response failed verification
    #[error("envelope rejected: {0}")]
    Rejected(#[from] EnvelopeError),
}
