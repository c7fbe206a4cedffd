//! Periodic cache cleanup outside the request path

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache_store::CacheStore;

/// Shortest sweep period; `interval` panics on a zero period
const MIN_CLEANUP_INTERVAL: Duration = Duration::from_secs(1);

/// Spawn a task that evicts entries older than `max_age` every `every`
///
/// The returned handle should be aborted at teardown.
pub fn spawn_cache_cleanup(cache: CacheStore, every: Duration, max_age: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every.max(MIN_CLEANUP_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = cache.cleanup(max_age);
            if removed > 0 {
                info!("Cache cleanup removed {} entries, {} remain", removed, cache.len());
            } else {
                debug!("Cache cleanup found nothing older than {:?}", max_age);
            }
        }
    })
}
