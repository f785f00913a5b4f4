//! Cache Module
//!
//! The public cache facade. Values go through the codec, raw bytes go through
//! a [`Backend`], and every failure comes back as a [`CacheError`].

mod keys;
mod ttl;

#[cfg(test)]
mod property_tests;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::backend::{Backend, MemoryBackend, RedisBackend};
use crate::codec::{self, CacheValue};
use crate::config::Config;
use crate::error::{CacheError, Result};

pub use keys::ExistenceSet;
pub use ttl::TtlState;

// == Cache ==
/// Typed cache client.
///
/// Cloning is cheap; clones share the backend and the closed state. Every
/// operation is bounded by the operation timeout and can be cancelled by
/// dropping its future. Nothing is retried.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn Backend>,
    closed: Arc<AtomicBool>,
    operation_timeout: Duration,
}

impl Cache {
    /// Longest expiry honoured by `set` and `expire` (100 years). Longer
    /// TTLs are stored without expiry on every backend.
    pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

    // == Constructors ==
    /// Connects to Redis with `config`.
    ///
    /// The config is validated first; an invalid config never dials.
    pub async fn connect(config: Config) -> Result<Self> {
        let backend = RedisBackend::connect(&config).await?;
        Ok(Self::with_backend(Arc::new(backend), config.operation_timeout))
    }

    /// Wraps an existing backend.
    pub fn with_backend(backend: Arc<dyn Backend>, operation_timeout: Duration) -> Self {
        debug!("cache facade over {} backend", backend.name());
        Self {
            backend,
            closed: Arc::new(AtomicBool::new(false)),
            operation_timeout,
        }
    }

    /// A cache over a fresh in-memory backend with the default timeout.
    pub fn in_memory() -> Self {
        Self::with_backend(
            Arc::new(MemoryBackend::new()),
            Config::DEFAULT_OPERATION_TIMEOUT,
        )
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    // == Get ==
    /// Returns the value stored under `key` as text.
    pub async fn get(&self, key: &str) -> Result<String> {
        let payload = self.fetch("get", key).await?;
        codec::decode_text(key, payload)
    }

    /// Returns the stored payload unchanged.
    pub async fn get_bytes(&self, key: &str) -> Result<Vec<u8>> {
        self.fetch("get_bytes", key).await
    }

    /// Decodes the value under `key` into `dest`.
    ///
    /// `dest` is only written when the key exists and decoding succeeds.
    pub async fn get_into<T: DeserializeOwned>(&self, key: &str, dest: &mut T) -> Result<()> {
        *dest = self.get_as(key).await?;
        Ok(())
    }

    /// Decodes and returns the value under `key`.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let payload = self.fetch("get_as", key).await?;
        codec::decode(key, &payload)
    }

    // == Set ==
    /// Encodes `value` and stores it under `key`.
    ///
    /// A zero `ttl`, or one above [`Cache::MAX_TTL`], means the key never
    /// expires. Encoding failures
    /// (`NilValue`, `SerializeValue`) are reported before the backend is
    /// contacted.
    pub async fn set<V: CacheValue + ?Sized>(&self, key: &str, value: &V, ttl: Duration) -> Result<()> {
        let payload = codec::encode(value)?;
        debug!(
            "set key={} bytes={} path={:?} ttl={:?}",
            key,
            payload.len(),
            payload.path(),
            ttl
        );
        self.run("set", self.backend.set(key, payload.as_bytes(), expiry(ttl)))
            .await
    }

    // == Delete ==
    /// Deletes all given keys. Absent keys are not an error.
    pub async fn del<K: AsRef<str>>(&self, keys: &[K]) -> Result<()> {
        self.ensure_open()?;
        if keys.is_empty() {
            return Ok(());
        }
        let keys = owned_keys(keys);
        let removed = self.run("del", self.backend.del(&keys)).await?;
        debug!("del keys={} removed={}", keys.len(), removed);
        Ok(())
    }

    // == Has ==
    pub async fn has(&self, key: &str) -> Result<bool> {
        self.run("has", self.backend.exists(key)).await
    }

    // == Batch Classification ==
    /// Checks all keys in one round trip and splits them into present and missing.
    pub async fn classify_keys<K: AsRef<str>>(&self, keys: &[K]) -> Result<ExistenceSet> {
        self.ensure_open()?;
        if keys.is_empty() {
            return Ok(ExistenceSet::default());
        }
        let keys = owned_keys(keys);
        let flags = self
            .run("exists_many", self.backend.exists_many(&keys))
            .await?;
        ExistenceSet::partition(keys, flags)
    }

    /// The subset of `keys` that currently exist.
    pub async fn existing_keys<K: AsRef<str>>(&self, keys: &[K]) -> Result<Vec<String>> {
        Ok(self.classify_keys(keys).await?.present)
    }

    /// The subset of `keys` that do not currently exist.
    pub async fn missing_keys<K: AsRef<str>>(&self, keys: &[K]) -> Result<Vec<String>> {
        Ok(self.classify_keys(keys).await?.missing)
    }

    // == Expiry ==
    /// Replaces the key's expiry; a zero `ttl` or one above [`Cache::MAX_TTL`]
    /// removes it. Absent keys are left alone without an error.
    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let updated = self
            .run("expire", self.backend.expire(key, expiry(ttl)))
            .await?;
        if !updated {
            debug!("expire key={} skipped: key absent", key);
        }
        Ok(())
    }

    /// Remaining lifetime of `key`.
    ///
    /// Returns `NoExpiry` or `Remaining(..)` for existing keys. An absent key
    /// is reported as `KeyNotFound`; use [`Cache::ttl_state`] to receive
    /// `TtlState::Absent` as a value instead.
    pub async fn ttl(&self, key: &str) -> Result<TtlState> {
        match self.ttl_state(key).await? {
            TtlState::Absent => Err(CacheError::key_not_found(key)),
            state => Ok(state),
        }
    }

    /// Remaining lifetime of `key` with absence as a plain value.
    pub async fn ttl_state(&self, key: &str) -> Result<TtlState> {
        self.run("ttl", self.backend.ttl(key)).await
    }

    // == Flush ==
    /// Removes every key in the active database. Irreversible.
    pub async fn flush_all(&self) -> Result<()> {
        self.run("flush_all", self.backend.flush_db()).await?;
        info!("flushed {} backend", self.backend.name());
        Ok(())
    }

    // == Lifecycle ==
    pub async fn ping(&self) -> Result<()> {
        self.run("ping", self.backend.ping()).await
    }

    /// Releases the backend. Later calls fail with `Closed`; closing again is a no-op.
    pub async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!("cache already closed");
            return Ok(());
        }
        self.backend.close().await?;
        info!("cache closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // == Internals ==
    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(CacheError::Closed);
        }
        Ok(())
    }

    /// Runs one backend round trip under the closed check and the timeout.
    async fn run<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.ensure_open()?;
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "cache {} timed out after {:?}",
                    operation, self.operation_timeout
                );
                Err(CacheError::Timeout {
                    operation,
                    after: self.operation_timeout,
                })
            }
        }
    }

    /// Reads a payload, turning absence into `KeyNotFound`.
    async fn fetch(&self, operation: &'static str, key: &str) -> Result<Vec<u8>> {
        self.run(operation, self.backend.get(key))
            .await?
            .ok_or_else(|| CacheError::key_not_found(key))
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("backend", &self.backend.name())
            .field("closed", &self.is_closed())
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

/// Zero and anything past `MAX_TTL` mean "no expiry".
fn expiry(ttl: Duration) -> Option<Duration> {
    (!ttl.is_zero() && ttl <= Cache::MAX_TTL).then_some(ttl)
}

fn owned_keys<K: AsRef<str>>(keys: &[K]) -> Vec<String> {
    keys.iter().map(|key| key.as_ref().to_string()).collect()
}
