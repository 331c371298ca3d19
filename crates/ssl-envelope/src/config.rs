//! Read-only envelope configuration passed to the builder and the opener.

use http::HeaderName;
use std::time::Duration;

/// `X-SSL-Timestamp`: decimal milliseconds since the Unix epoch.
pub const TIMESTAMP_HEADER: &str = "X-SSL-Timestamp";
/// `X-SSL-SecurityKey`: base64 of RSA-wrapped `<aesKey>||<aesIv>`.
pub const SECURITY_KEY_HEADER: &str = "X-SSL-SecurityKey";
/// `X-SSL-SignatureKey`: base64 of the RSA-wrapped signature key.
pub const SIGNATURE_KEY_HEADER: &str = "X-SSL-SignatureKey";
/// `X-SSL-Signature`: base64 of the HMAC-SHA256 digest.
pub const SIGNATURE_HEADER: &str = "X-SSL-Signature";

/// Separator between the AES key and IV inside the security key.
pub const SECURITY_KEY_SEPARATOR: &str = "||";

/// Default freshness window.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(60);

/// Names of the four envelope headers.
#[derive(Debug, Clone)]
pub struct HeaderNames {
    pub timestamp: HeaderName,
    pub security_key: HeaderName,
    pub signature_key: HeaderName,
    pub signature: HeaderName,
}

impl HeaderNames {
    /// All four names, in validation order.
    pub fn all(&self) -> [&HeaderName; 4] {
        [
            &self.timestamp,
            &self.security_key,
            &self.signature_key,
            &self.signature,
        ]
    }
}

impl Default for HeaderNames {
    fn default() -> Self {
        // HeaderName::from_static requires lowercase; matching is case-insensitive
        Self {
            timestamp: HeaderName::from_static("x-ssl-timestamp"),
            security_key: HeaderName::from_static("x-ssl-securitykey"),
            signature_key: HeaderName::from_static("x-ssl-signaturekey"),
            signature: HeaderName::from_static("x-ssl-signature"),
        }
    }
}

/// Envelope settings shared by both sides of an exchange.
#[derive(Debug, Clone)]
pub struct EnvelopeConfig {
    /// Header names
    pub headers: HeaderNames,
    /// Maximum age of a timestamp before the message counts as a replay
    pub freshness_window: Duration,
}

impl EnvelopeConfig {
    /// Default headers with a custom freshness window.
    pub fn with_window(freshness_window: Duration) -> Self {
        Self {
            headers: HeaderNames::default(),
            freshness_window,
        }
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self::with_window(DEFAULT_FRESHNESS_WINDOW)
    }
}
