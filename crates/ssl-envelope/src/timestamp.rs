//! Millisecond timestamps and freshness checks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Time source trait for testability
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// System clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            // Clock before Unix epoch - return 0 rather than panic
            .unwrap_or(0)
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug, Default)]
pub struct FixedTimeSource {
    millis: AtomicU64,
}

impl FixedTimeSource {
    pub fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl TimeSource for FixedTimeSource {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Parse a decimal millisecond timestamp as it appears on the wire.
pub fn parse_timestamp(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// True once `now` is strictly past `sent + window`.
///
/// A message sent exactly `window` ago is still fresh. Timestamps in the
/// future are never considered expired.
pub fn is_expired(sent: u64, now: u64, window: Duration) -> bool {
    let window_ms = window.as_millis() as u64;
    now > sent.saturating_add(window_ms)
}

/// Parse `value` and check it against `window`. Unparseable counts as expired.
pub fn is_stale(value: &str, now: u64, window: Duration) -> bool {
    match parse_timestamp(value) {
        Some(sent) => is_expired(sent, now, window),
        None => true,
    }
}
