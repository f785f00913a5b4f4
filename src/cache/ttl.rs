//! TTL State Module
//!
//! Three-way result of a remaining-lifetime query.

use std::fmt;
use std::time::Duration;

// == TTL State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TtlState {
    /// The key exists and never expires.
    NoExpiry,
    /// The key does not exist (never set, deleted or expired).
    Absent,
    /// The key exists and expires after this duration.
    Remaining(Duration),
}

impl TtlState {
    pub fn is_absent(&self) -> bool {
        matches!(self, TtlState::Absent)
    }

    /// True if the key exists, with or without an expiry.
    pub fn exists(&self) -> bool {
        !self.is_absent()
    }

    /// The remaining lifetime, if the key has one.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            TtlState::Remaining(remaining) => Some(*remaining),
            TtlState::NoExpiry | TtlState::Absent => None,
        }
    }
}

impl fmt::Display for TtlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TtlState::NoExpiry => write!(f, "no expiry"),
            TtlState::Absent => write!(f, "absent"),
            TtlState::Remaining(remaining) => write!(f, "{}ms", remaining.as_millis()),
        }
    }
}
