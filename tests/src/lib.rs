//! # SSL Envelope Gateway Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── support.rs        # Sample backend and gateway harness
//! └── integration/      # Client → gateway → backend over real sockets
//!     ├── flows.rs      # Happy paths and error pass-through
//!     └── tampering.rs  # Hand-built and altered envelopes
//!
//! tests/benches/
//! └── envelope_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ssl-tests
//!
//! # By category
//! cargo test -p ssl-tests integration::flows::
//! cargo test -p ssl-tests integration::tampering::
//!
//! # Benchmarks
//! cargo bench -p ssl-tests
//! ```

#![allow(dead_code)]

pub mod integration;
pub mod support;
