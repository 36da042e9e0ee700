//! Mini Cache demo
//!
//! Opens a cache from environment configuration, runs a short scripted
//! workload against it and keeps the TTL sweep running until shutdown.

use std::collections::HashMap;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_cache::{spawn_interval_sweep, Cache, CacheConfig, CacheHandle};

/// Main entry point for the Mini Cache demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the cache, restoring `CACHE_SNAPSHOT_PATH` if set
/// 4. Start background TTL sweep task
/// 5. Run the demo workload and log cache info
/// 6. Wait for SIGINT/SIGTERM, then stop the sweep
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mini Cache demo");

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: max_size={}, default_ttl={}s, sweep_interval={}s, snapshot={:?}",
        config.max_size, config.default_ttl_seconds, config.sweep_interval_secs, config.snapshot_path
    );

    let cache = CacheHandle::new(Cache::new(&config).context("opening cache")?);
    let sweep_handle = spawn_interval_sweep(cache.clone(), config.sweep_interval_secs);

    run_workload(&cache).await?;

    let info = cache.with(|c| c.info()).await;
    info!("Cache info: {}", serde_json::to_string(&info)?);

    shutdown_signal().await;
    sweep_handle.abort();
    warn!("Sweep task aborted");

    if let Err(e) = cache.with(|c| c.save()).await {
        warn!("Final snapshot save failed: {}", e);
    }
    info!("Shutdown complete");
    Ok(())
}

/// Exercises each command family once.
async fn run_workload(cache: &CacheHandle) -> anyhow::Result<()> {
    {
        let mut c = cache.lock().await;
        c.set("session:42", "active", Some(30))?;
        c.hset("user:1", "name", "Ada")?;
        c.hset("user:1", "plan", "pro")?;
        c.rpush("queue:emails", ["welcome", "receipt"])?;
        c.sadd("tags:rust", ["cache", "embedded", "cache"])?;

        info!("user:* keys: {:?}", c.keys("user:*"));
        info!("queue: {:?}", c.lrange("queue:emails", 0, -1)?);
        info!("session ttl: {}s", c.ttl("session:42"));
    }

    let catalog: HashMap<&str, &str> = HashMap::from([("sku:1", "Widget")]);
    let product = cache
        .cache_aside(
            "product:sku:1",
            || async {
                catalog
                    .get("sku:1")
                    .map(|name| name.to_string())
                    .context("unknown sku")
            },
            Some(60),
        )
        .await?;
    info!("cache-aside product: {:?}", product);

    cache
        .write_through(
            "order:1001",
            "paid",
            |value| async move {
                info!("ledger recorded order:1001 = {:?}", value);
                Ok::<_, anyhow::Error>(())
            },
            None,
        )
        .await?;

    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
