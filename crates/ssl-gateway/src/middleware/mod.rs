//! Gateway middleware.
//!
//! Layer order: Request → Trace → Envelope → Proxy
//!
//! The envelope layer only acts on guarded routes; everything else passes
//! straight through to the proxy.

pub mod envelope;
pub mod metrics;

pub use envelope::{EnvelopeLayer, EnvelopeValidator};
pub use metrics::{GatewayMetrics, RequestTimer};
