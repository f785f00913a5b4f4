//! In-Memory Backend
//!
//! A process-local backend with the same observable semantics as the Redis
//! backend. Useful for tests and for embedding the cache without a server.

mod entry;
mod store;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::Backend;
use crate::cache::TtlState;
use crate::error::{CacheError, Result};

pub use entry::CacheEntry;
pub use store::MemoryStore;

// == Memory Backend ==
/// Shared handle to an in-memory store. Clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: Arc<RwLock<MemoryStore>>,
    closed: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes expired entries and returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(CacheError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        // Write lock: reads may drop expired entries.
        Ok(self.store.write().await.get(key))
    }

    async fn set(&self, key: &str, payload: &[u8], ttl: Option<Duration>) -> Result<()> {
        self.ensure_open()?;
        self.store.write().await.set(key, payload.to_vec(), ttl);
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        self.ensure_open()?;
        Ok(self.store.write().await.delete(keys))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.store.write().await.contains(key))
    }

    async fn exists_many(&self, keys: &[String]) -> Result<Vec<bool>> {
        self.ensure_open()?;
        let mut store = self.store.write().await;
        Ok(keys.iter().map(|key| store.contains(key)).collect())
    }

    async fn ttl(&self, key: &str) -> Result<TtlState> {
        self.ensure_open()?;
        Ok(self.store.write().await.ttl(key))
    }

    async fn expire(&self, key: &str, ttl: Option<Duration>) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.store.write().await.expire(key, ttl))
    }

    async fn flush_db(&self) -> Result<()> {
        self.ensure_open()?;
        self.store.write().await.clear();
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.ensure_open()
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!("memory backend already closed");
        }
        Ok(())
    }
}
