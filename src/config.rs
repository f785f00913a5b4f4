//! Configuration Module
//!
//! Backend connectivity settings, loaded from environment variables and
//! validated before any connection attempt.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Backend connection parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend host name or IP address
    pub host: String,
    /// Backend TCP port
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Logical database index
    pub db: i64,
    /// Upper bound for establishing the initial connection
    pub connect_timeout: Duration,
    /// Upper bound for a single cache operation round trip
    pub operation_timeout: Duration,
}

impl Config {
    pub const DEFAULT_PORT: u16 = 6379;
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
    pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(3);

    /// Creates a config for `host:port` with defaults for everything else.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Loads a Config from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_HOST` - Backend host (default: localhost)
    /// - `REDIS_PORT` - Backend port (default: 6379)
    /// - `REDIS_USERNAME` / `REDIS_PASSWORD` - Optional credentials
    /// - `REDIS_DB` - Logical database index (default: 0)
    /// - `CACHE_CONNECT_TIMEOUT_MS` - Connect timeout (default: 5000)
    /// - `CACHE_OPERATION_TIMEOUT_MS` - Per-operation timeout (default: 3000)
    ///
    /// Values that are present but cannot be parsed are reported rather than
    /// replaced by defaults. The result is validated before it is returned.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = match env_var("REDIS_PORT") {
            Some(raw) => parse_port(&raw)?,
            None => defaults.port,
        };

        let config = Self {
            host: env_var("REDIS_HOST").unwrap_or(defaults.host),
            port,
            username: env_var("REDIS_USERNAME"),
            password: env_var("REDIS_PASSWORD"),
            db: parse_or("REDIS_DB", defaults.db)?,
            connect_timeout: parse_or(
                "CACHE_CONNECT_TIMEOUT_MS",
                defaults.connect_timeout.as_millis() as u64,
            )
            .map(Duration::from_millis)?,
            operation_timeout: parse_or(
                "CACHE_OPERATION_TIMEOUT_MS",
                defaults.operation_timeout.as_millis() as u64,
            )
            .map(Duration::from_millis)?,
        };

        config.validate()?;
        Ok(config)
    }

    // == Validate ==
    /// Checks host, port and database index, in that order.
    ///
    /// A host made only of whitespace counts as missing.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(CacheError::MissingHost);
        }
        if self.port == 0 {
            return Err(CacheError::InvalidPort(0));
        }
        if self.db < 0 {
            return Err(CacheError::InvalidDb(self.db));
        }
        Ok(())
    }

    // == Address ==
    /// Returns the `host:port` authority, bracketing IPv6 literals.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: Self::DEFAULT_PORT,
            username: None,
            password: None,
            db: 0,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            operation_timeout: Self::DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

// == Env Helpers ==
fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T> {
    match env_var(name) {
        Some(raw) => raw.trim().parse().map_err(|_| CacheError::InvalidConfig {
            name,
            value: raw.clone(),
        }),
        None => Ok(default),
    }
}

/// Parses a port, mapping numbers outside the u16 range to `InvalidPort`.
fn parse_port(raw: &str) -> Result<u16> {
    let port: i64 = raw.trim().parse().map_err(|_| CacheError::InvalidConfig {
        name: "REDIS_PORT",
        value: raw.to_string(),
    })?;
    u16::try_from(port).map_err(|_| CacheError::InvalidPort(port))
}
