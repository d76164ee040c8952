//! A session store that expires idle sessions in the background.
//!
//! Run with `RUST_LOG=tidecache=debug,timed_usage=info cargo run --example timed_usage`
//! to see the prune summaries the cache logs.

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tidecache::{
    Cache, CacheConfig, CacheError, CacheExt, CacheMetrics, CachePolicy, PrunerConfig, RemovalListener,
    ThreadPruner, TimedCache,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), CacheError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tidecache=debug,timed_usage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pruner = Arc::new(ThreadPruner::start(PrunerConfig::default().with_thread_name("session-pruner"))?);

    let on_expire: RemovalListener<String, u64> = Arc::new(|session, user| {
        info!(%session, user, "session closed");
    });
    let sessions: Arc<TimedCache<String, u64>> = Arc::new(TimedCache::init(
        CacheConfig::timed(Duration::from_millis(300)),
        Some(on_expire),
    ));
    sessions.schedule_prune(pruner.clone(), Duration::from_millis(100))?;

    for user in 0..5u64 {
        sessions.put(format!("session-{user}"), user);
    }
    // the admin session stays open for as long as the demo runs
    sessions.put_with_ttl("session-admin".to_string(), 0, Duration::from_secs(60));

    // keep session-0 alive by touching it; the others go idle
    for _ in 0..6 {
        thread::sleep(Duration::from_millis(100));
        sessions.get(&"session-0".to_string());
    }
    info!(live = sessions.len(), "after idle period");

    let user = sessions.get_or_insert_with("session-9".to_string(), || 9);
    info!(user, "session opened on demand");

    for (name, value) in sessions.metrics() {
        info!(metric = %name, value, "timed cache");
    }

    // the same wiring, with the policy picked from configuration
    let policy: CachePolicy = std::env::var("CACHE_POLICY")
        .unwrap_or_else(|_| "lru".to_string())
        .parse()?;
    let lookups = policy.build::<u64, String>(CacheConfig::new(2), None);
    for id in 0..4u64 {
        lookups.put(id, format!("row {id}"));
    }
    info!(%policy, pruned = lookups.prune(), len = lookups.len(), "configured cache");

    sessions.cancel_prune_schedule();
    pruner.shutdown();
    Ok(())
}
