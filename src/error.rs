//! Error types for the cache client
//!
//! Provides unified error handling using thiserror. Every domain error exposes
//! a stable [`ErrorKind`] tag so callers can match on what went wrong without
//! comparing formatted messages.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

/// Boxed error used for causes the crate does not own (custom encoders, transports).
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

// == Error Kind ==
/// Stable classification of a [`CacheError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingHost,
    InvalidPort,
    InvalidDb,
    InvalidConfig,
    KeyNotFound,
    NilValue,
    SerializeValue,
    Decode,
    Closed,
    Timeout,
    /// Failure surfaced by the backend transport, passed through as-is.
    Backend,
}

// == Cache Error Enum ==
/// Unified error type for the cache client.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Config has an empty host
    #[error("missing cache host")]
    MissingHost,

    /// Config port outside 1..=65535
    #[error("cache port must be between 1 and 65535, got {0}")]
    InvalidPort(i64),

    /// Config database index below zero
    #[error("cache DB index must be >= 0, got {0}")]
    InvalidDb(i64),

    /// An environment value could not be parsed
    #[error("invalid config value for {name}: {value:?}")]
    InvalidConfig { name: &'static str, value: String },

    #[error("key not found in cache: {key}")]
    KeyNotFound { key: String },

    #[error("cannot cache nil value")]
    NilValue,

    #[error("failed to serialize cache value: {source}")]
    SerializeValue {
        #[source]
        source: BoxError,
    },

    #[error("failed to decode cached value: key={key:?}")]
    Decode {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("cache client is closed")]
    Closed,

    #[error("cache operation {operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error(transparent)]
    Backend(BoxError),
}

impl CacheError {
    // == Constructors ==
    pub fn key_not_found(key: impl Into<String>) -> Self {
        CacheError::KeyNotFound { key: key.into() }
    }

    pub fn serialize(source: impl Into<BoxError>) -> Self {
        CacheError::SerializeValue {
            source: source.into(),
        }
    }

    pub fn decode(key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        CacheError::Decode {
            key: key.into(),
            source: source.into(),
        }
    }

    /// Wraps a transport failure without reinterpreting it.
    pub fn backend(source: impl Into<BoxError>) -> Self {
        CacheError::Backend(source.into())
    }

    // == Kind ==
    /// Returns the stable kind tag of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CacheError::MissingHost => ErrorKind::MissingHost,
            CacheError::InvalidPort(_) => ErrorKind::InvalidPort,
            CacheError::InvalidDb(_) => ErrorKind::InvalidDb,
            CacheError::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            CacheError::KeyNotFound { .. } => ErrorKind::KeyNotFound,
            CacheError::NilValue => ErrorKind::NilValue,
            CacheError::SerializeValue { .. } => ErrorKind::SerializeValue,
            CacheError::Decode { .. } => ErrorKind::Decode,
            CacheError::Closed => ErrorKind::Closed,
            CacheError::Timeout { .. } => ErrorKind::Timeout,
            CacheError::Backend(_) => ErrorKind::Backend,
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    /// Shorthand for the common "cache miss" check.
    pub fn is_not_found(&self) -> bool {
        self.is(ErrorKind::KeyNotFound)
    }

    /// The key this error refers to, when it carries one.
    pub fn key(&self) -> Option<&str> {
        match self {
            CacheError::KeyNotFound { key } | CacheError::Decode { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl PartialEq<ErrorKind> for CacheError {
    fn eq(&self, other: &ErrorKind) -> bool {
        self.kind() == *other
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(Box::new(err))
    }
}

// == Chain Inspection ==
/// Finds the first [`CacheError`] in an error's source chain and returns its kind.
///
/// Lets callers that wrapped a `CacheError` (for example with `anyhow::Context`)
/// still ask "is this a cache miss".
pub fn find_kind(err: &(dyn StdError + 'static)) -> Option<ErrorKind> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(cache_err) = e.downcast_ref::<CacheError>() {
            return Some(cache_err.kind());
        }
        current = e.source();
    }
    None
}

/// Returns true if any error in the chain is a [`CacheError`] of `kind`.
pub fn is_kind(err: &(dyn StdError + 'static), kind: ErrorKind) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(cache_err) = e.downcast_ref::<CacheError>() {
            if cache_err.is(kind) {
                return true;
            }
        }
        current = e.source();
    }
    false
}

// == Result Type Alias ==
/// Convenience Result type for the cache client.
pub type Result<T> = std::result::Result<T, CacheError>;
