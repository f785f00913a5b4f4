//! cachekit - A typed cache client
//!
//! Stores arbitrary values in Redis (or in memory) through a pluggable codec,
//! with stable error kinds and explicit TTL states.
//!
//! ```no_run
//! use std::time::Duration;
//! use cachekit::{Cache, Config};
//!
//! # async fn run() -> cachekit::error::Result<()> {
//! let cache = Cache::connect(Config::new("localhost", 6379)).await?;
//! cache.set("greeting", "hello", Duration::from_secs(60)).await?;
//! assert_eq!(cache.get("greeting").await?, "hello");
//! cache.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod tasks;

pub use backend::{Backend, MemoryBackend, RedisBackend};
pub use cache::{Cache, ExistenceSet, TtlState};
pub use codec::{Binary, BinaryEncode, CacheValue, Json, StructuredEncode};
pub use config::Config;
pub use error::{CacheError, ErrorKind, Result};
pub use tasks::spawn_expiry_sweeper;
