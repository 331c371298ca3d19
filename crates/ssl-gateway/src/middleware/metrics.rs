//! Envelope pipeline counters.
//!
//! Exposed as JSON on `/health`.

use ssl_envelope::EnvelopeError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Gateway metrics
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    // Request counters
    pub requests_bypassed: AtomicU64,
    pub requests_accepted: AtomicU64,
    pub requests_rejected: AtomicU64,

    // Rejections by reason
    pub rejected_missing_header: AtomicU64,
    pub rejected_timestamp_expired: AtomicU64,
    pub rejected_invalid_signature: AtomicU64,
    pub rejected_key_unavailable: AtomicU64,
    pub rejected_invalid_signature_key: AtomicU64,
    pub rejected_signature_mismatch: AtomicU64,
    pub rejected_invalid_security_key: AtomicU64,
    pub rejected_decryption_failure: AtomicU64,

    // Response counters
    pub responses_encrypted: AtomicU64,
    pub responses_passed_through: AtomicU64,

    // Forwarding
    pub upstream_errors: AtomicU64,

    // Latency tracking for accepted requests
    pub total_latency_ms: AtomicU64,
    pub request_count_for_latency: AtomicU64,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request that skipped the envelope pipeline
    pub fn record_bypass(&self) {
        self.requests_bypassed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request whose envelope opened
    pub fn record_accepted(&self) {
        self.requests_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected envelope
    pub fn record_rejection(&self, error: &EnvelopeError) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);

        let counter = match error {
            EnvelopeError::MissingHeader(_) => &self.rejected_missing_header,
            EnvelopeError::TimestampExpired => &self.rejected_timestamp_expired,
            EnvelopeError::InvalidSignature => &self.rejected_invalid_signature,
            EnvelopeError::KeyUnavailable => &self.rejected_key_unavailable,
            EnvelopeError::InvalidSignatureKey => &self.rejected_invalid_signature_key,
            EnvelopeError::SignatureMismatch => &self.rejected_signature_mismatch,
            EnvelopeError::InvalidSecurityKey => &self.rejected_invalid_security_key,
            EnvelopeError::DecryptionFailure => &self.rejected_decryption_failure,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a sealed response
    pub fn record_response(&self, encrypted: bool, latency_ms: u64) {
        if encrypted {
            self.responses_encrypted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.responses_passed_through
                .fetch_add(1, Ordering::Relaxed);
        }

        self.total_latency_ms
            .fetch_add(latency_ms, Ordering::Relaxed);
        self.request_count_for_latency
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed downstream call
    pub fn record_upstream_error(&self) {
        self.upstream_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get average latency in ms
    pub fn average_latency_ms(&self) -> f64 {
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        let count = self.request_count_for_latency.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "requests": {
                "bypassed": self.requests_bypassed.load(Ordering::Relaxed),
                "accepted": self.requests_accepted.load(Ordering::Relaxed),
                "rejected": self.requests_rejected.load(Ordering::Relaxed),
            },
            "rejections": {
                "missing_header": self.rejected_missing_header.load(Ordering::Relaxed),
                "timestamp_expired": self.rejected_timestamp_expired.load(Ordering::Relaxed),
                "invalid_signature": self.rejected_invalid_signature.load(Ordering::Relaxed),
                "key_unavailable": self.rejected_key_unavailable.load(Ordering::Relaxed),
                "invalid_signature_key": self.rejected_invalid_signature_key.load(Ordering::Relaxed),
                "signature_mismatch": self.rejected_signature_mismatch.load(Ordering::Relaxed),
                "invalid_security_key": self.rejected_invalid_security_key.load(Ordering::Relaxed),
                "decryption_failure": self.rejected_decryption_failure.load(Ordering::Relaxed),
            },
            "responses": {
                "encrypted": self.responses_encrypted.load(Ordering::Relaxed),
                "passed_through": self.responses_passed_through.load(Ordering::Relaxed),
            },
            "upstream": {
                "errors": self.upstream_errors.load(Ordering::Relaxed),
            },
            "latency": {
                "average_ms": self.average_latency_ms(),
            }
        })
    }
}

/// Request timing helper
pub struct RequestTimer {
    start: Instant,
    metrics: Arc<GatewayMetrics>,
}

impl RequestTimer {
    pub fn new(metrics: Arc<GatewayMetrics>) -> Self {
        Self {
            start: Instant::now(),
            metrics,
        }
    }

    pub fn finish(self, encrypted: bool) {
        let latency_ms = self.start.elapsed().as_millis() as u64;
        self.metrics.record_response(encrypted, latency_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_by_reason() {
        let metrics = GatewayMetrics::new();

        metrics.record_rejection(&EnvelopeError::TimestampExpired);
        metrics.record_rejection(&EnvelopeError::TimestampExpired);
        metrics.record_rejection(&EnvelopeError::MissingHeader("x-ssl-signature".into()));

        assert_eq!(metrics.requests_rejected.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.rejected_timestamp_expired.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.rejected_missing_header.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_average_latency() {
        let metrics = GatewayMetrics::new();

        metrics.record_response(true, 100);
        metrics.record_response(false, 200);
        metrics.record_response(true, 300);

        assert!((metrics.average_latency_ms() - 200.0).abs() < 0.01);
        assert_eq!(metrics.responses_encrypted.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.responses_passed_through.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_json_export() {
        let metrics = GatewayMetrics::new();
        metrics.record_bypass();
        metrics.record_accepted();
        metrics.record_rejection(&EnvelopeError::SignatureMismatch);

        let json = metrics.to_json();
        assert_eq!(json["requests"]["bypassed"], 1);
        assert_eq!(json["requests"]["accepted"], 1);
        assert_eq!(json["rejections"]["signature_mismatch"], 1);
    }

    #[test]
    fn test_request_timer() {
        let metrics = Arc::new(GatewayMetrics::new());
        RequestTimer::new(Arc::clone(&metrics)).finish(true);
        assert_eq!(metrics.request_count_for_latency.load(Ordering::Relaxed), 1);
    }
}
