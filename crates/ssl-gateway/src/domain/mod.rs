//! Domain layer: configuration and errors.

pub mod config;
pub mod error;
