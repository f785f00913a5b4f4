//! Background Tasks Module
//!
//! # Tasks
//! - Expiry sweeper: drops expired entries from a `MemoryBackend` on an interval

mod sweeper;

pub use sweeper::spawn_expiry_sweeper;
