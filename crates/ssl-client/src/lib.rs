//! # SSL Client
//!
//! Client side of the envelope protocol over HTTP.
//!
//! ```ignore
//! use ssl_client::{ClientConfig, GatewayClient};
//! use reqwest::Method;
//!
//! let client = GatewayClient::connect(&ClientConfig::from_env()?).await?;
//! let id = client
//!     .send(Method::POST, "sample/api/v1/values", Some(body), Some("application/json"))
//!     .await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;

pub use client::GatewayClient;
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
