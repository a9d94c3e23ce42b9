//! Long-running background task that keeps the metrics cache warm so
//! requests rarely pay for an upstream round-trip.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::DataCache;
use crate::upstream::MetricsSource;

/// Populate the cache once at start-up. Failures are already logged by the cache.
pub async fn warm_up<S: MetricsSource>(cache: Arc<DataCache<S>>) {
    if let Ok(metrics) = cache.refresh().await {
        info!(
            "Metrics cache warmed: raised={} target={} donations={}",
            metrics.amount_raised, metrics.target, metrics.donation_count
        );
    }
}

/// Refresh the cache every `interval`, forever. Errors never stop the loop.
pub async fn run<S: MetricsSource>(cache: Arc<DataCache<S>>, interval: Duration) {
    info!("Background refresher starting, interval {}s", interval.as_secs());

    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; warm_up already covered start-up.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if cache.refresh().await.is_ok() {
            debug!("Background refresh succeeded");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::errors::{BadgeError, Result};
    use crate::metrics::CampaignMetrics;

    /// Fails every other call.
    struct Flaky {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetricsSource for Flaky {
        async fn fetch(&self) -> Result<CampaignMetrics> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 1 {
                Err(BadgeError::Upstream("flaky".to_string()))
            } else {
                Ok(CampaignMetrics::new(Some(n as f64), Some(10.0), Some(1.0)))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_refreshing_through_failures() {
        let cache = Arc::new(DataCache::new(
            Flaky {
                calls: AtomicUsize::new(0),
            },
            Duration::from_secs(300),
        ));

        warm_up(Arc::clone(&cache)).await;
        assert_eq!(cache.snapshot().map(|(m, _)| m.amount_raised), Some(0.0));

        let task = tokio::spawn(run(Arc::clone(&cache), Duration::from_secs(10)));
        // Three ticks: fail, succeed, fail.
        tokio::time::sleep(Duration::from_secs(35)).await;
        task.abort();

        assert_eq!(cache.source().calls.load(Ordering::SeqCst), 4);
        assert_eq!(cache.snapshot().map(|(m, _)| m.amount_raised), Some(2.0));
    }
}
