//! # SSL Envelope
//!
//! Application-level confidentiality and integrity for HTTP exchanges that
//! may cross untrusted hops.
//!
//! Each request carries its own signature key and AES session key, wrapped
//! with the gateway's RSA public key and sent in `X-SSL-*` headers. The
//! request is signed over `"<METHOD> <path> <timestamp>"`, and every response
//! is signed over `"<status> <timestamp>"` with the same key. Bodies of
//! requests and of successful responses are AES-128-CBC encrypted and base64
//! encoded.
//!
//! | Side | Type | Role |
//! |------|------|------|
//! | Client | [`EnvelopeBuilder`] | seal requests, verify and open responses |
//! | Gateway | [`EnvelopeOpener`] | verify and open requests, seal responses |
//!
//! Neither side shares mutable state; secrets live for one exchange.

pub mod builder;
pub mod config;
pub mod error;
pub mod keys;
pub mod opener;
pub mod signing;
pub mod timestamp;

pub use builder::{EnvelopeBuilder, SealedRequest};
pub use config::{
    EnvelopeConfig, HeaderNames, SECURITY_KEY_HEADER, SIGNATURE_HEADER, SIGNATURE_KEY_HEADER,
    TIMESTAMP_HEADER,
};
pub use error::EnvelopeError;
pub use keys::{ExchangeSecrets, SessionKey, SignatureKey};
pub use opener::{EnvelopeHeaders, EnvelopeOpener};
pub use timestamp::{FixedTimeSource, SystemTimeSource, TimeSource};
