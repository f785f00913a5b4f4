//! Connects to Redis using the `REDIS_*` environment variables, stores a
//! value, reads it back and closes the connection.
//!
//! ```text
//! REDIS_HOST=localhost REDIS_PORT=6379 cargo run --example redis
//! ```

use std::time::Duration;

use cachekit::{Cache, Config};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cachekit=info,redis=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!("Connecting to redis at {} (db {})", config.address(), config.db);

    let cache = match Cache::connect(config).await {
        Ok(cache) => cache,
        Err(err) => {
            error!("failed to connect redis: {}", err);
            return Err(err.into());
        }
    };
    info!("redis connected");

    cache
        .set("demo:greeting", "hello", Duration::from_secs(60))
        .await?;
    let greeting = cache.get("demo:greeting").await?;
    let ttl = cache.ttl("demo:greeting").await?;
    info!("demo:greeting = {:?} (ttl {})", greeting, ttl);

    cache.del(&["demo:greeting"]).await?;
    cache.close().await?;
    info!("redis connection closed");

    Ok(())
}
