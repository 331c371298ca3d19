//! Gateway configuration with validation.
//!
//! Loaded from a TOML file (every section optional) and then patched from
//! environment variables.

use serde::{Deserialize, Serialize};
use ssl_envelope::EnvelopeConfig;
use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the TOML config file
pub const ENV_CONFIG_PATH: &str = "SSL_GATEWAY_CONFIG";
/// Environment override for `http.port`
pub const ENV_PORT: &str = "SSL_GATEWAY_PORT";
/// Environment override for `envelope.timestamp_expire_seconds`
pub const ENV_TIMESTAMP_EXPIRE_SECONDS: &str = "SSL_TIMESTAMP_EXPIRE_SECONDS";
/// Environment override for `telemetry.log_level`
pub const ENV_LOG_LEVEL: &str = "SSL_LOG_LEVEL";

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Envelope validation settings
    pub envelope: EnvelopeSettings,
    /// RSA key distribution and caching
    pub rsa: RsaConfig,
    /// Key-value store holding the RSA key pair
    pub store: StoreConfig,
    /// Upstream to downstream route table
    pub routes: Vec<RouteConfig>,
    /// Logging configuration
    pub telemetry: TelemetryConfig,
}

impl GatewayConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Load from `SSL_GATEWAY_CONFIG` (or defaults), apply environment
    /// overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(ENV_PORT) {
            self.http.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv(ENV_PORT, port))?;
        }
        if let Some(seconds) = lookup(ENV_TIMESTAMP_EXPIRE_SECONDS) {
            self.envelope.timestamp_expire_seconds = seconds
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv(ENV_TIMESTAMP_EXPIRE_SECONDS, seconds))?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.telemetry.log_level = level;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.max_body_bytes == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_body_bytes cannot be 0".into(),
            ));
        }

        if self.http.upstream_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "upstream_timeout cannot be 0".into(),
            ));
        }

        if self.envelope.timestamp_expire_seconds == 0 {
            return Err(ConfigError::InvalidTimeout(
                "timestamp_expire_seconds cannot be 0".into(),
            ));
        }

        if !self.envelope.guarded_path_prefix.starts_with('/') {
            return Err(ConfigError::InvalidPath(
                self.envelope.guarded_path_prefix.clone(),
            ));
        }

        if !self.rsa.request_path.starts_with('/') {
            return Err(ConfigError::InvalidPath(self.rsa.request_path.clone()));
        }

        if self.rsa.private_key.trim().is_empty() || self.rsa.public_key.trim().is_empty() {
            return Err(ConfigError::Invalid("rsa key names cannot be empty".into()));
        }

        let mut seen = HashSet::new();
        for route in &self.routes {
            if !route.upstream_path_prefix.starts_with('/') {
                return Err(ConfigError::InvalidRoute(format!(
                    "upstream_path_prefix must start with '/': {}",
                    route.upstream_path_prefix
                )));
            }
            if !route.downstream_path_prefix.is_empty()
                && !route.downstream_path_prefix.starts_with('/')
            {
                return Err(ConfigError::InvalidRoute(format!(
                    "downstream_path_prefix must start with '/': {}",
                    route.downstream_path_prefix
                )));
            }
            if reqwest::Url::parse(&route.downstream_base_url).is_err() {
                return Err(ConfigError::InvalidRoute(format!(
                    "invalid downstream_base_url: {}",
                    route.downstream_base_url
                )));
            }
            if !seen.insert(route.upstream_path_prefix.trim_end_matches('/')) {
                return Err(ConfigError::InvalidRoute(format!(
                    "duplicate upstream_path_prefix: {}",
                    route.upstream_path_prefix
                )));
            }
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }

    /// Envelope settings in the form the opener consumes.
    pub fn envelope_config(&self) -> EnvelopeConfig {
        EnvelopeConfig::with_window(Duration::from_secs(
            self.envelope.timestamp_expire_seconds,
        ))
    }

    /// Path of the public key endpoint.
    pub fn public_key_path(&self) -> String {
        format!("{}/public", self.rsa.request_path.trim_end_matches('/'))
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 5000)
    pub port: u16,
    /// Max request or response body buffered by the gateway (default: 1MB)
    pub max_body_bytes: usize,
    /// Timeout for a downstream call
    #[serde(with = "humantime_serde")]
    pub upstream_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 5000,
            max_body_bytes: 1024 * 1024, // 1MB
            upstream_timeout: Duration::from_secs(30),
        }
    }
}

/// Envelope validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeSettings {
    /// Maximum request timestamp age
    pub timestamp_expire_seconds: u64,
    /// Routes whose downstream path starts with this prefix are guarded
    pub guarded_path_prefix: String,
}

impl Default for EnvelopeSettings {
    fn default() -> Self {
        Self {
            timestamp_expire_seconds: 60,
            guarded_path_prefix: "/api".to_string(),
        }
    }
}

/// RSA key distribution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RsaConfig {
    /// Prefix of the public key endpoint (`<request_path>/public`)
    pub request_path: String,
    /// How long loaded keys stay cached (`0s` disables caching)
    #[serde(with = "humantime_serde")]
    pub cache_ttl: Duration,
    /// Store key of the PEM private key
    pub private_key: String,
    /// Store key of the PEM public key
    pub public_key: String,
}

impl Default for RsaConfig {
    fn default() -> Self {
        Self {
            request_path: "/rsa".to_string(),
            cache_ttl: Duration::from_secs(300),
            private_key: "rsa/private".to_string(),
            public_key: "rsa/public".to_string(),
        }
    }
}

/// Where key material lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// In-process map, mostly for tests
    Memory {
        #[serde(default)]
        entries: HashMap<String, String>,
    },
    /// One file per key under `root`
    File { root: PathBuf },
    /// Consul KV over HTTP
    Consul {
        address: String,
        #[serde(default)]
        token: Option<String>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            root: PathBuf::from("keys"),
        }
    }
}

/// One upstream to downstream mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Incoming path prefix, e.g. `/sample/api`
    pub upstream_path_prefix: String,
    /// Backend base URL, e.g. `http://127.0.0.1:5001`
    pub downstream_base_url: String,
    /// Replacement for the upstream prefix, e.g. `/api`
    #[serde(default)]
    pub downstream_path_prefix: String,
    /// Backend service name; only named services are guarded
    #[serde(default)]
    pub service_name: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Default filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config: {0}")]
    Io(String),
    /// Config file is not valid TOML for this schema
    #[error("cannot parse config: {0}")]
    Parse(String),
    /// Environment override has the wrong type
    #[error("invalid value for {0}: {1}")]
    InvalidEnv(&'static str, String),
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Path that must be absolute is not
    #[error("invalid path: {0}")]
    InvalidPath(String),
    /// Malformed route entry
    #[error("invalid route: {0}")]
    InvalidRoute(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Humantime serde module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() != 0 {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        } else {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" before "s" and "m"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .ok()
                .and_then(|m| m.checked_mul(60))
                .map(Duration::from_secs)
                .ok_or("invalid minutes")
        } else {
            // Try parsing as plain seconds
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
