//! Cache Entry Module
//!
//! A stored payload together with its optional expiry deadline.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// Represents a single stored payload with expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored bytes
    pub payload: Vec<u8>,
    /// Expiration deadline, None = no expiration
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry that expires after `ttl`, or never if `ttl` is None.
    ///
    /// A `ttl` too large to express as a deadline means no expiry.
    pub fn new(payload: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            payload,
            expires_at: deadline(ttl),
        }
    }

    // == Is Expired ==
    /// An entry is expired once `now` reaches its deadline.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Remaining lifetime, or None if the entry never expires.
    ///
    /// Returns `Some(Duration::ZERO)` once the deadline has passed.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Moves the deadline to `ttl` from now, or clears it.
    pub fn set_ttl(&mut self, ttl: Option<Duration>) {
        self.expires_at = deadline(ttl);
    }
}

fn deadline(ttl: Option<Duration>) -> Option<Instant> {
    ttl.and_then(|ttl| Instant::now().checked_add(ttl))
}
