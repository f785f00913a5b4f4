//! Expiry Sweeper Task
//!
//! Background task that periodically purges expired entries from an in-memory
//! backend. Reads already hide expired entries; the sweeper reclaims memory
//! for keys nobody reads again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::backend::MemoryBackend;

/// Spawns a task that purges expired entries from `backend` every `interval`.
///
/// The task runs until aborted through the returned handle or until the
/// backend is closed.
///
/// # Example
/// ```ignore
/// let backend = MemoryBackend::new();
/// let sweeper = spawn_expiry_sweeper(backend.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_expiry_sweeper(backend: MemoryBackend, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting expiry sweeper with interval of {:?}", interval);

        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;

            if backend.is_closed() {
                info!("Expiry sweeper stopping: backend closed");
                break;
            }

            let removed = backend.purge_expired().await;
            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}
