//! Key-value stores holding the gateway's RSA key pair.

use crate::domain::config::StoreConfig;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Key is not a relative, slash-separated name
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Filesystem failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport failure talking to a remote store
    #[error("http error: {0}")]
    Http(String),

    /// Remote store answered with an unexpected status
    #[error("unexpected status {0}")]
    UnexpectedStatus(u16),
}

/// Read access to string values by key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Value for `key`, or `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
}

/// Build the store described by `config`.
pub fn from_config(
    config: &StoreConfig,
    timeout: Duration,
) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    Ok(match config {
        StoreConfig::Memory { entries } => Arc::new(MemoryStore::new(entries.clone())),
        StoreConfig::File { root } => Arc::new(FileStore::new(root.clone())),
        StoreConfig::Consul { address, token } => {
            Arc::new(ConsulStore::new(address, token.clone(), timeout)?)
        }
    })
}

/// In-process map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.write().remove(key)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }
}

/// One file per key: `rsa/private` lives at `<root>/rsa/private`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !plain {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Key file not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Consul KV: `GET {address}/v1/kv/{key}?raw`.
#[derive(Debug, Clone)]
pub struct ConsulStore {
    client: reqwest::Client,
    address: String,
    token: Option<String>,
}

impl ConsulStore {
    pub fn new(
        address: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Http(e.to_string()))?;
        Ok(Self {
            client,
            address: address.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/v1/kv/{}?raw", self.address, key.trim_start_matches('/'))
    }
}

#[async_trait]
impl KeyValueStore for ConsulStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut request = self.client.get(self.url_for(key));
        if let Some(token) = &self.token {
            request = request.header("X-Consul-Token", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::UnexpectedStatus(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;
        Ok(Some(text))
    }
}
