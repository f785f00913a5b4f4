//! Backend Module
//!
//! The storage collaborator behind the cache facade. A backend moves raw byte
//! payloads; encoding, decoding and error classification happen in the facade.

pub mod memory;
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;

use crate::cache::TtlState;
use crate::error::Result;

pub use self::memory::MemoryBackend;
pub use self::redis::RedisBackend;

// == Backend Port ==
/// Raw key-value operations a cache backend must provide.
///
/// Implementations must allow many concurrent calls from independent tasks.
/// Transport failures are returned as `CacheError::Backend` and are never
/// reclassified by the facade. Every call made after [`Backend::close`] must
/// fail with `CacheError::Closed`.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// A short name for logs, e.g. "redis" or "memory".
    fn name(&self) -> &'static str;

    /// Returns the stored payload, or `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores a payload. `None` means the key never expires.
    async fn set(&self, key: &str, payload: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Deletes keys and returns how many existed.
    async fn del(&self, keys: &[String]) -> Result<u64>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Checks every key in one round trip. The result has one flag per input
    /// key, in input order.
    async fn exists_many(&self, keys: &[String]) -> Result<Vec<bool>>;

    async fn ttl(&self, key: &str) -> Result<TtlState>;

    /// Replaces the key's expiry; `None` removes it. Returns false if the key
    /// was absent.
    async fn expire(&self, key: &str, ttl: Option<Duration>) -> Result<bool>;

    /// Removes every key in the active database.
    async fn flush_db(&self) -> Result<()>;

    async fn ping(&self) -> Result<()>;

    async fn close(&self) -> Result<()>;
}
