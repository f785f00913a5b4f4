//! Redis Backend
//!
//! Talks to a Redis server through a multiplexed connection manager. The
//! manager is cheap to clone and safe for concurrent use, so every call clones
//! it out from under a read lock and runs its command without blocking others.

use std::time::Duration;

use ::redis::aio::ConnectionManager;
use ::redis::{Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::Backend;
use crate::cache::TtlState;
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Redis Backend ==
pub struct RedisBackend {
    conn: RwLock<Option<ConnectionManager>>,
    address: String,
}

impl RedisBackend {
    // == Connect ==
    /// Validates `config`, opens a connection and pings the server.
    ///
    /// No connection is attempted when validation fails. Connecting and the
    /// initial ping are each bounded by `config.connect_timeout`.
    pub async fn connect(config: &Config) -> Result<Self> {
        config.validate()?;

        let address = config.address();
        let client = Client::open(connection_info(config))?;

        let conn = tokio::time::timeout(config.connect_timeout, client.get_connection_manager())
            .await
            .map_err(|_| CacheError::Timeout {
                operation: "connect",
                after: config.connect_timeout,
            })??;

        let backend = Self {
            conn: RwLock::new(Some(conn)),
            address,
        };

        tokio::time::timeout(config.connect_timeout, backend.ping())
            .await
            .map_err(|_| CacheError::Timeout {
                operation: "ping",
                after: config.connect_timeout,
            })??;

        info!("Connected to redis at {} (db {})", backend.address, config.db);
        Ok(backend)
    }

    /// The `host:port` this backend was opened against.
    pub fn address(&self) -> &str {
        &self.address
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        self.conn.read().await.clone().ok_or(CacheError::Closed)
    }
}

fn connection_info(config: &Config) -> ConnectionInfo {
    let host = config.host.trim_start_matches('[').trim_end_matches(']');
    ConnectionInfo {
        addr: ConnectionAddr::Tcp(host.to_string(), config.port),
        redis: RedisConnectionInfo {
            db: config.db,
            username: config.username.clone(),
            password: config.password.clone(),
            ..Default::default()
        },
    }
}

/// Maps a `PTTL` reply to a [`TtlState`].
///
/// Redis answers -2 for a missing key and -1 for a key without expiry. Any
/// other negative reply is treated as missing.
fn ttl_from_pttl(reply: i64) -> TtlState {
    match reply {
        -1 => TtlState::NoExpiry,
        ms if ms >= 0 => TtlState::Remaining(Duration::from_millis(ms as u64)),
        _ => TtlState::Absent,
    }
}

/// `PERSIST` then `EXISTS` in one `MULTI`/`EXEC` round trip.
///
/// `PERSIST` answers 0 for keys without a timeout too, so existence is read
/// separately.
fn persist_pipeline(key: &str) -> ::redis::Pipeline {
    let mut pipe = ::redis::pipe();
    pipe.atomic().cmd("PERSIST").arg(key).cmd("EXISTS").arg(key);
    pipe
}

/// Milliseconds for `PX`/`PEXPIRE`, rounded up so sub-millisecond TTLs stay valid.
fn ttl_millis(ttl: Duration) -> u64 {
    let ms = ttl.as_millis().min(u128::from(u64::MAX)) as u64;
    if Duration::from_millis(ms) < ttl {
        ms.saturating_add(1)
    } else {
        ms.max(1)
    }
}

#[async_trait]
impl Backend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        let payload: Option<Vec<u8>> = ::redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(payload)
    }

    async fn set(&self, key: &str, payload: &[u8], ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection().await?;
        let mut cmd = ::redis::cmd("SET");
        cmd.arg(key).arg(payload);
        if let Some(ttl) = ttl {
            cmd.arg("PX").arg(ttl_millis(ttl));
        }
        let _: () = cmd.query_async(&mut conn).await?;
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        let mut conn = self.connection().await?;
        let removed: u64 = ::redis::cmd("DEL").arg(keys).query_async(&mut conn).await?;
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let count: u64 = ::redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(count == 1)
    }

    async fn exists_many(&self, keys: &[String]) -> Result<Vec<bool>> {
        // One pipelined EXISTS per key: multi-key EXISTS only returns a total.
        let mut conn = self.connection().await?;
        let mut pipe = ::redis::pipe();
        for key in keys {
            pipe.cmd("EXISTS").arg(key);
        }
        let counts: Vec<u64> = pipe.query_async(&mut conn).await?;
        Ok(counts.into_iter().map(|count| count == 1).collect())
    }

    async fn ttl(&self, key: &str) -> Result<TtlState> {
        let mut conn = self.connection().await?;
        let reply: i64 = ::redis::cmd("PTTL").arg(key).query_async(&mut conn).await?;
        Ok(ttl_from_pttl(reply))
    }

    async fn expire(&self, key: &str, ttl: Option<Duration>) -> Result<bool> {
        let mut conn = self.connection().await?;
        match ttl {
            Some(ttl) => {
                let updated: i64 = ::redis::cmd("PEXPIRE")
                    .arg(key)
                    .arg(ttl_millis(ttl))
                    .query_async(&mut conn)
                    .await?;
                Ok(updated == 1)
            }
            None => {
                let (_, exists): (i64, u64) =
                    persist_pipeline(key).query_async(&mut conn).await?;
                Ok(exists == 1)
            }
        }
    }

    async fn flush_db(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: () = ::redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: String = ::redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        match self.conn.write().await.take() {
            Some(_) => info!("Closed redis connection to {}", self.address),
            None => debug!("redis connection to {} already closed", self.address),
        }
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_ttl_from_pttl() {
        assert_eq!(ttl_from_pttl(-2), TtlState::Absent);
        assert_eq!(ttl_from_pttl(-1), TtlState::NoExpiry);
        assert_eq!(ttl_from_pttl(0), TtlState::Remaining(Duration::ZERO));
        assert_eq!(
            ttl_from_pttl(1500),
            TtlState::Remaining(Duration::from_millis(1500))
        );
        assert_eq!(ttl_from_pttl(-7), TtlState::Absent);
    }

    #[test]
    fn test_ttl_millis_rounds_up() {
        assert_eq!(ttl_millis(Duration::from_secs(60)), 60_000);
        assert_eq!(ttl_millis(Duration::from_micros(1500)), 2);
        assert_eq!(ttl_millis(Duration::from_nanos(1)), 1);
    }

    #[test]
    fn test_persist_pipeline_is_atomic() {
        let packed = String::from_utf8(persist_pipeline("k").get_packed_pipeline()).unwrap();

        let order: Vec<usize> = ["MULTI", "PERSIST", "EXISTS", "EXEC"]
            .iter()
            .map(|cmd| packed.find(cmd).unwrap())
            .collect();
        assert!(order.windows(2).all(|pair| pair[0] < pair[1]), "{}", packed);
    }

    #[test]
    fn test_connection_info() {
        let config = Config {
            username: Some("default".to_string()),
            password: Some("example".to_string()),
            db: 1,
            ..Config::new("[::1]", 6380)
        };

        let info = connection_info(&config);
        assert!(matches!(info.addr, ConnectionAddr::Tcp(ref host, 6380) if host == "::1"));
        assert_eq!(info.redis.db, 1);
        assert_eq!(info.redis.username.as_deref(), Some("default"));
        assert_eq!(info.redis.password.as_deref(), Some("example"));
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config_before_dialing() {
        let config = Config::new("localhost", 0);
        let err = RedisBackend::connect(&config).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidPort);

        let config = Config::new("", 6379);
        let err = RedisBackend::connect(&config).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::MissingHost);
    }
}
