//! End-to-end tests over loopback sockets.

pub mod flows;
pub mod tampering;
