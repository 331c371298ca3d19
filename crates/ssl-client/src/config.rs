//! Client configuration.

use std::path::Path;
use std::time::Duration;

/// Environment override for the gateway base URL
pub const ENV_GATEWAY_ADDRESS: &str = "SSL_GATEWAY_ADDRESS";
/// Environment variable naming a PEM file with the gateway public key
pub const ENV_PUBLIC_KEY_FILE: &str = "SSL_PUBLIC_KEY_FILE";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Gateway base URL
    pub gateway_address: String,
    /// Path of the gateway's public key endpoint
    pub public_key_path: String,
    /// Gateway public key; fetched from the gateway when absent
    pub public_key_pem: Option<String>,
    /// Freshness window applied to response timestamps
    pub response_window_seconds: u64,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_address: "http://127.0.0.1:5000".to_string(),
            public_key_path: "/rsa/public".to_string(),
            public_key_pem: None,
            response_window_seconds: 60,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ClientConfig {
    /// Defaults patched from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup(ENV_GATEWAY_ADDRESS) {
            self.gateway_address = address;
        }
        if let Some(path) = lookup(ENV_PUBLIC_KEY_FILE) {
            let pem = std::fs::read_to_string(Path::new(&path)).map_err(|source| {
                ConfigError::Io {
                    path: path.clone(),
                    source,
                }
            })?;
            self.public_key_pem = Some(pem);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if reqwest::Url::parse(&self.gateway_address).is_err() {
            return Err(ConfigError::Invalid(format!(
                "invalid gateway_address: {}",
                self.gateway_address
            )));
        }
        if self.response_window_seconds == 0 {
            return Err(ConfigError::Invalid(
                "response_window_seconds cannot be 0".into(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid("request_timeout cannot be 0".into()));
        }
        Ok(())
    }

    pub fn response_window(&self) -> Duration {
        Duration::from_secs(self.response_window_seconds)
    }
}
