// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! SSL gateway: reverse proxy that opens and seals X-SSL envelopes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         ssl-gateway                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  GET /rsa/public ──→ KeyRepository ──→ KeyValueStore         │
//! │  GET /health     ──→ GatewayMetrics                          │
//! │                                                              │
//! │  everything else:                                            │
//! │    TraceLayer → EnvelopeLayer → Proxy ──reqwest──→ backend   │
//! │                  │                                           │
//! │                  ├─ RouteTable (guarded?)                    │
//! │                  └─ KeyRepository (RSA private key)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Envelope pipeline (guarded routes)
//!
//! 1. All four `X-SSL-*` headers present
//! 2. Timestamp inside the freshness window
//! 3. Signature non-empty
//! 4. RSA private key loaded
//! 5. Signature key unwrapped
//! 6. Request signature matches
//! 7. Session key unwrapped and parsed
//! 8. Body decrypted
//! 9. Envelope headers stripped, request forwarded
//! 10. Response stamped and signed
//! 11. Successful responses encrypted
//!
//! Failures in steps 1-8 answer `401` without touching the backend.
//!
//! # Usage
//!
//! ```ignore
//! use ssl_gateway::{GatewayConfig, SslGatewayService};
//!
//! let service = SslGatewayService::new(GatewayConfig::load()?)?;
//! let listener = service.bind().await?;
//! service.run(listener, shutdown_signal()).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod api;
pub mod domain;
pub mod keys;
pub mod middleware;
pub mod proxy;
pub mod routes;
pub mod service;
pub mod store;
pub mod telemetry;

pub use domain::config::{
    ConfigError, EnvelopeSettings, GatewayConfig, HttpConfig, RouteConfig, RsaConfig,
    StoreConfig, TelemetryConfig,
};
pub use domain::error::{ApiError, GatewayError};
pub use keys::{CachedKeyRepository, KeyRepository, KeyRepositoryError};
pub use middleware::{EnvelopeLayer, EnvelopeValidator, GatewayMetrics};
pub use routes::{PrefixGuard, RouteGuard, RouteTable};
pub use service::SslGatewayService;
pub use store::{ConsulStore, FileStore, KeyValueStore, MemoryStore, StoreError};
pub use telemetry::init_tracing;
