//! Memory Store Module
//!
//! HashMap storage with lazy expiry. Expired entries are dropped the moment a
//! read observes them, and in bulk by `cleanup_expired`.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use super::entry::CacheEntry;
use crate::cache::TtlState;

// == Memory Store ==
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, CacheEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // == Set ==
    /// Stores a payload, overwriting any previous value and expiry.
    pub fn set(&mut self, key: &str, payload: Vec<u8>, ttl: Option<Duration>) {
        self.entries
            .insert(key.to_string(), CacheEntry::new(payload, ttl));
    }

    // == Get ==
    /// Returns the payload if the key exists and has not expired.
    pub fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        self.live_entry(key).map(|entry| entry.payload.clone())
    }

    // == Delete ==
    /// Removes keys and returns how many live entries were removed.
    pub fn delete(&mut self, keys: &[String]) -> u64 {
        let now = Instant::now();
        keys.iter()
            .filter_map(|key| self.entries.remove(key))
            .filter(|entry| !entry.is_expired_at(now))
            .count() as u64
    }

    // == Contains ==
    pub fn contains(&mut self, key: &str) -> bool {
        self.live_entry(key).is_some()
    }

    // == TTL ==
    pub fn ttl(&mut self, key: &str) -> TtlState {
        match self.live_entry(key) {
            None => TtlState::Absent,
            Some(entry) => match entry.ttl_remaining() {
                None => TtlState::NoExpiry,
                Some(remaining) => TtlState::Remaining(remaining),
            },
        }
    }

    // == Expire ==
    /// Replaces the expiry of a live key. Returns false if the key is absent.
    pub fn expire(&mut self, key: &str, ttl: Option<Duration>) -> bool {
        match self.live_entry(key) {
            Some(entry) => {
                entry.set_ttl(ttl);
                true
            }
            None => false,
        }
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - self.entries.len()
    }

    /// Number of stored entries, including expired ones not yet cleaned up.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a key, dropping it first if it has expired.
    fn live_entry(&mut self, key: &str) -> Option<&mut CacheEntry> {
        if self.entries.get(key).is_some_and(CacheEntry::is_expired) {
            self.entries.remove(key);
            return None;
        }
        self.entries.get_mut(key)
    }
}
