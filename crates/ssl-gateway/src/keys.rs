//! RSA key repository with a TTL cache.
//!
//! Each key kind has a single cache slot. Readers clone the `Arc` out of the
//! slot under a read lock; a refill swaps in a new entry wholesale. Refills
//! are serialized by an async mutex and re-check the slot after acquiring
//! it, so concurrent misses load the store once per generation.
//!
//! `invalidate()` bumps the generation. A load that started under an older
//! generation returns its value to the caller but does not fill the slot.

use crate::domain::config::RsaConfig;
use crate::store::{KeyValueStore, StoreError};
use async_trait::async_trait;
use parking_lot::RwLock;
use ssl_crypto::{normalize_key_text, CryptoError, RsaPrivateCipher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Key repository errors
#[derive(Debug, thiserror::Error)]
pub enum KeyRepositoryError {
    /// The store has no value (or a blank one) under this key
    #[error("not found rsa key: {0}")]
    NotFound(String),

    /// The store could not be read
    #[error("key store error: {0}")]
    Store(#[from] StoreError),

    /// The stored text is not a usable key
    #[error("invalid rsa key: {0}")]
    InvalidKey(#[from] CryptoError),
}

/// Source of the gateway's RSA key pair.
#[async_trait]
pub trait KeyRepository: Send + Sync {
    /// Normalized PEM text of the public key.
    async fn public_key(&self) -> Result<Arc<str>, KeyRepositoryError>;

    /// Parsed private key.
    async fn private_key(&self) -> Result<Arc<RsaPrivateCipher>, KeyRepositoryError>;

    /// Drop cached material; the next call reloads.
    fn invalidate(&self);
}

struct CacheEntry<T: ?Sized> {
    value: Arc<T>,
    loaded_at: Instant,
}

type Slot<T> = RwLock<Option<CacheEntry<T>>>;

/// Store-backed repository with a TTL cache. A zero TTL disables caching.
pub struct CachedKeyRepository {
    store: Arc<dyn KeyValueStore>,
    private_key_name: String,
    public_key_name: String,
    ttl: Duration,
    public: Slot<str>,
    private: Slot<RsaPrivateCipher>,
    refill: Mutex<()>,
    generation: AtomicU64,
}

impl CachedKeyRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &RsaConfig) -> Self {
        Self {
            store,
            private_key_name: config.private_key.clone(),
            public_key_name: config.public_key.clone(),
            ttl: config.cache_ttl,
            public: RwLock::new(None),
            private: RwLock::new(None),
            refill: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    fn fresh<T: ?Sized>(&self, slot: &Slot<T>) -> Option<Arc<T>> {
        slot.read()
            .as_ref()
            .filter(|entry| entry.loaded_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.value))
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Fill the slot unless the cache was invalidated since `generation`.
    fn fill<T: ?Sized>(&self, slot: &Slot<T>, value: &Arc<T>, generation: u64) {
        let mut slot = slot.write();
        if self.generation() != generation {
            debug!("Discarding key loaded before invalidation");
            return;
        }
        *slot = Some(CacheEntry {
            value: Arc::clone(value),
            loaded_at: Instant::now(),
        });
    }

    async fn load(&self, key: &str) -> Result<String, KeyRepositoryError> {
        let text = self
            .store
            .get(key)
            .await?
            .map(|text| normalize_key_text(&text))
            .filter(|text| !text.is_empty())
            .ok_or_else(|| KeyRepositoryError::NotFound(key.to_string()))?;
        debug!(key, "Loaded key material from store");
        Ok(text)
    }
}

#[async_trait]
impl KeyRepository for CachedKeyRepository {
    async fn public_key(&self) -> Result<Arc<str>, KeyRepositoryError> {
        if let Some(key) = self.fresh(&self.public) {
            return Ok(key);
        }
        let _refill = self.refill.lock().await;
        if let Some(key) = self.fresh(&self.public) {
            return Ok(key);
        }

        let generation = self.generation();
        let key: Arc<str> = Arc::from(self.load(&self.public_key_name).await?);
        self.fill(&self.public, &key, generation);
        Ok(key)
    }

    async fn private_key(&self) -> Result<Arc<RsaPrivateCipher>, KeyRepositoryError> {
        if let Some(key) = self.fresh(&self.private) {
            return Ok(key);
        }
        let _refill = self.refill.lock().await;
        if let Some(key) = self.fresh(&self.private) {
            return Ok(key);
        }

        let generation = self.generation();
        let pem = self.load(&self.private_key_name).await?;
        let key = Arc::new(RsaPrivateCipher::from_pem(&pem)?);
        self.fill(&self.private, &key, generation);
        info!(key = %self.private_key_name, "RSA private key loaded");
        Ok(key)
    }

    fn invalidate(&self) {
        let mut public = self.public.write();
        let mut private = self.private.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        *public = None;
        *private = None;
        debug!("Key cache invalidated");
    }
}

impl std::fmt::Debug for CachedKeyRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedKeyRepository")
            .field("private_key_name", &self.private_key_name)
            .field("public_key_name", &self.public_key_name)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
