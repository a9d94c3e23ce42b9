//! Freshness-bounded metrics cache with stale-on-failure fallback.
//!
//! Lifecycle of the single entry:
//!
//! * starts empty;
//! * overwritten on every successful fetch;
//! * never cleared: a failed refresh leaves the last good snapshot in place.
//!
//! Readers always get *something* renderable: the fresh value, the last
//! good value, or [`CampaignMetrics::fallback`] when nothing ever succeeded.

use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::errors::{BadgeError, Result};
use crate::metrics::CampaignMetrics;
use crate::upstream::MetricsSource;

#[derive(Debug, Clone, Copy, Default)]
struct CacheEntry {
    data: Option<CampaignMetrics>,
    fetched_at: Option<DateTime<Utc>>,
    /// Completed upstream attempts, successful or not.
    attempts: u64,
}

impl CacheEntry {
    fn fresh_at(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> Option<CampaignMetrics> {
        match (self.data, self.fetched_at) {
            (Some(data), Some(fetched_at)) if now - fetched_at < ttl => Some(data),
            _ => None,
        }
    }
}

/// Which snapshot a refresh attempt settled on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    /// The fetch succeeded; this value must be stored.
    Fresh(CampaignMetrics),
    /// The fetch failed; serving the last good snapshot.
    Stale(CampaignMetrics),
    /// The fetch failed and nothing was ever cached.
    Default(CampaignMetrics),
}

impl Selection {
    pub fn metrics(&self) -> CampaignMetrics {
        match self {
            Self::Fresh(m) | Self::Stale(m) | Self::Default(m) => *m,
        }
    }
}

/// Decide what to serve after a fetch attempt.
pub fn select_snapshot(
    outcome: &Result<CampaignMetrics>,
    cached: Option<&CampaignMetrics>,
) -> Selection {
    match (outcome, cached) {
        (Ok(fresh), _) => Selection::Fresh(*fresh),
        (Err(_), Some(previous)) => Selection::Stale(*previous),
        (Err(_), None) => Selection::Default(CampaignMetrics::fallback()),
    }
}

pub struct DataCache<S> {
    source: S,
    ttl: chrono::Duration,
    entry: RwLock<CacheEntry>,
    /// Held for the duration of a refresh so concurrent stale readers share one fetch.
    refresh_guard: Mutex<()>,
}

impl<S: MetricsSource> DataCache<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::weeks(52)),
            entry: RwLock::new(CacheEntry::default()),
            refresh_guard: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Current metrics. Never fails.
    ///
    /// A successful fetch is stamped with the time it completed, not the
    /// time the caller arrived.
    pub async fn get_metrics(&self) -> CampaignMetrics {
        self.resolve(Utc::now(), Utc::now).await
    }

    /// [`get_metrics`](Self::get_metrics) against a fixed clock.
    #[cfg(test)]
    pub async fn get_metrics_at(&self, now: DateTime<Utc>) -> CampaignMetrics {
        self.resolve(now, || now).await
    }

    async fn resolve(
        &self,
        now: DateTime<Utc>,
        stamp: impl FnOnce() -> DateTime<Utc>,
    ) -> CampaignMetrics {
        let seen = self.read();
        if let Some(hit) = seen.fresh_at(now, self.ttl) {
            debug!("Metrics cache hit");
            return hit;
        }

        let _guard = self.refresh_guard.lock().await;
        // Someone else tried upstream while we waited; share their outcome.
        let current = self.read();
        if current.attempts != seen.attempts {
            debug!("Reusing the outcome of a concurrent refresh");
            return current.data.unwrap_or_else(CampaignMetrics::fallback);
        }

        let outcome = self.source.fetch().await;
        let selection = select_snapshot(&outcome, current.data.as_ref());
        self.record(&outcome, stamp());
        if let Err(e) = &outcome {
            let action = match selection {
                Selection::Stale(_) => "serving last good snapshot",
                _ => "no snapshot cached, serving defaults",
            };
            log_failure(e, action);
        }
        selection.metrics()
    }

    /// Fetch unconditionally, storing the result on success.
    ///
    /// Unlike [`get_metrics`](Self::get_metrics) the error is returned to the
    /// caller; the cached entry is left untouched on failure.
    pub async fn refresh(&self) -> Result<CampaignMetrics> {
        self.force(Utc::now).await
    }

    #[cfg(test)]
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> Result<CampaignMetrics> {
        self.force(|| now).await
    }

    async fn force(&self, stamp: impl FnOnce() -> DateTime<Utc>) -> Result<CampaignMetrics> {
        let _guard = self.refresh_guard.lock().await;
        let outcome = self.source.fetch().await;
        self.record(&outcome, stamp());
        if let Err(e) = &outcome {
            log_failure(e, "cache left unchanged");
        }
        outcome
    }

    /// The cached snapshot and when it was fetched, regardless of age.
    #[cfg(test)]
    pub fn snapshot(&self) -> Option<(CampaignMetrics, DateTime<Utc>)> {
        let entry = self.read();
        entry.data.zip(entry.fetched_at)
    }

    fn record(&self, outcome: &Result<CampaignMetrics>, at: DateTime<Utc>) {
        let mut entry = self.entry.write().unwrap_or_else(|e| e.into_inner());
        entry.attempts = entry.attempts.wrapping_add(1);
        if let Ok(metrics) = outcome {
            entry.data = Some(*metrics);
            entry.fetched_at = Some(at);
            debug!("Metrics cache updated at {at}");
        }
    }

    fn read(&self) -> CacheEntry {
        *self.entry.read().unwrap_or_else(|e| e.into_inner())
    }
}

fn log_failure(e: &BadgeError, action: &str) {
    if e.is_timeout() {
        warn!("Metrics fetch timed out ({action}): {e}");
    } else {
        warn!("Metrics fetch failed ({action}): {e}");
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::upstream::HttpSource;

    /// Replays scripted outcomes; once the script runs out every fetch fails.
    struct ScriptedSource {
        script: std::sync::Mutex<VecDeque<Result<CampaignMetrics>>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<CampaignMetrics>>) -> Self {
            Self {
                script: std::sync::Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MetricsSource for ScriptedSource {
        async fn fetch(&self) -> Result<CampaignMetrics> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BadgeError::Upstream("script exhausted".to_string())))
        }
    }

    fn m(amount: f64, count: f64) -> CampaignMetrics {
        CampaignMetrics::new(Some(amount), Some(100_000.0), Some(count))
    }

    fn upstream_down() -> Result<CampaignMetrics> {
        Err(BadgeError::Upstream("down".to_string()))
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 1, 9, 0, 0).unwrap()
    }

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn selection_policy() {
        let good = m(10.0, 1.0);
        let previous = m(5.0, 1.0);

        assert_eq!(select_snapshot(&Ok(good), Some(&previous)), Selection::Fresh(good));
        assert_eq!(select_snapshot(&upstream_down(), Some(&previous)), Selection::Stale(previous));
        assert_eq!(
            select_snapshot(&upstream_down(), None),
            Selection::Default(CampaignMetrics::fallback())
        );
    }

    #[tokio::test]
    async fn first_failure_serves_defaults_and_stores_nothing() {
        let cache = DataCache::new(ScriptedSource::new(vec![upstream_down()]), TTL);
        assert_eq!(cache.get_metrics_at(t0()).await, CampaignMetrics::fallback());
        assert!(cache.snapshot().is_none());
    }

    #[tokio::test]
    async fn hits_within_ttl_do_not_fetch() {
        let cache = DataCache::new(ScriptedSource::new(vec![Ok(m(50_000.0, 37.0))]), TTL);

        let first = cache.get_metrics_at(t0()).await;
        let second = cache
            .get_metrics_at(t0() + chrono::Duration::seconds(299))
            .await;

        assert_eq!(first, m(50_000.0, 37.0));
        assert_eq!(first, second);
        assert_eq!(cache.source().calls(), 1);
    }

    #[tokio::test]
    async fn failure_after_success_serves_previous_value() {
        let cache = DataCache::new(
            ScriptedSource::new(vec![Ok(m(50_000.0, 37.0)), upstream_down()]),
            TTL,
        );

        cache.get_metrics_at(t0()).await;
        let later = t0() + chrono::Duration::seconds(301);
        assert_eq!(cache.get_metrics_at(later).await, m(50_000.0, 37.0));
        assert_eq!(cache.source().calls(), 2);

        // The stale entry keeps its original timestamp, so the next call retries.
        let (_, fetched_at) = cache.snapshot().unwrap();
        assert_eq!(fetched_at, t0());
    }

    #[tokio::test]
    async fn expired_entry_is_replaced_by_new_success() {
        let cache = DataCache::new(
            ScriptedSource::new(vec![Ok(m(1.0, 1.0)), Ok(m(2.0, 2.0))]),
            TTL,
        );

        cache.get_metrics_at(t0()).await;
        let later = t0() + chrono::Duration::seconds(300);
        assert_eq!(cache.get_metrics_at(later).await, m(2.0, 2.0));
        assert_eq!(cache.snapshot(), Some((m(2.0, 2.0), later)));
    }

    #[tokio::test]
    async fn refresh_returns_error_and_keeps_entry() {
        let cache = DataCache::new(
            ScriptedSource::new(vec![Ok(m(7.0, 1.0)), upstream_down()]),
            TTL,
        );

        assert_eq!(cache.refresh_at(t0()).await.unwrap(), m(7.0, 1.0));
        assert!(cache.refresh_at(t0()).await.is_err());
        assert_eq!(cache.snapshot(), Some((m(7.0, 1.0), t0())));
    }

    #[tokio::test]
    async fn concurrent_stale_readers_share_one_fetch() {
        let mut source = ScriptedSource::new(vec![Ok(m(3.0, 3.0))]);
        source.delay = Some(Duration::from_millis(50));
        let cache = Arc::new(DataCache::new(source, TTL));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move { cache.get_metrics_at(t0()).await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), m(3.0, 3.0));
        }
        assert_eq!(cache.source().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn outage_burst_shares_one_failed_fetch() {
        let mut source = ScriptedSource::new(vec![Ok(m(4.0, 4.0))]);
        source.delay = Some(Duration::from_secs(5));
        let cache = Arc::new(DataCache::new(source, TTL));
        cache.get_metrics_at(t0()).await;

        let later = t0() + chrono::Duration::seconds(301);
        let started = tokio::time::Instant::now();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move { cache.get_metrics_at(later).await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), m(4.0, 4.0));
        }

        assert_eq!(cache.source().calls(), 2);
        assert!(started.elapsed() < Duration::from_secs(6));
        assert_eq!(cache.snapshot(), Some((m(4.0, 4.0), t0())));
    }

    #[tokio::test(start_paused = true)]
    async fn cold_outage_burst_serves_defaults_after_one_fetch() {
        let mut source = ScriptedSource::new(vec![]);
        source.delay = Some(Duration::from_secs(5));
        let cache = Arc::new(DataCache::new(source, TTL));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move { cache.get_metrics_at(t0()).await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), CampaignMetrics::fallback());
        }
        assert_eq!(cache.source().calls(), 1);

        // A later request still retries upstream.
        cache.get_metrics_at(t0()).await;
        assert_eq!(cache.source().calls(), 2);
    }

    #[tokio::test]
    async fn fetched_at_is_taken_after_the_fetch_completes() {
        let mut source = ScriptedSource::new(vec![Ok(m(1.0, 1.0)), Ok(m(2.0, 2.0))]);
        source.delay = Some(Duration::from_millis(50));
        let cache = DataCache::new(source, TTL);

        let before = Utc::now();
        cache.get_metrics().await;
        let (_, fetched_at) = cache.snapshot().unwrap();
        assert!(fetched_at - before >= chrono::Duration::milliseconds(50));

        let before = Utc::now();
        cache.refresh().await.unwrap();
        let (_, fetched_at) = cache.snapshot().unwrap();
        assert!(fetched_at - before >= chrono::Duration::milliseconds(50));
    }

    /// An address that accepts connections and never answers.
    async fn stalled_upstream() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{addr}/exec")
    }

    #[tokio::test]
    async fn timed_out_fetch_serves_previous_snapshot() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(300))
            .build()
            .unwrap();
        let stalled = HttpSource::new(client, stalled_upstream().await);
        let timeout = stalled.fetch().await;
        assert!(matches!(timeout, Err(BadgeError::Http(_))));
        assert!(timeout.as_ref().is_err_and(BadgeError::is_timeout));

        let cache = DataCache::new(ScriptedSource::new(vec![Ok(m(9.0, 9.0)), timeout]), TTL);
        cache.get_metrics_at(t0()).await;
        let later = t0() + chrono::Duration::seconds(301);
        assert_eq!(cache.get_metrics_at(later).await, m(9.0, 9.0));
        assert_eq!(cache.snapshot(), Some((m(9.0, 9.0), t0())));
    }

    #[tokio::test]
    async fn timed_out_first_fetch_serves_defaults() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(300))
            .build()
            .unwrap();
        let cache = DataCache::new(HttpSource::new(client, stalled_upstream().await), TTL);
        assert_eq!(cache.get_metrics().await, CampaignMetrics::fallback());
        assert!(cache.snapshot().is_none());
    }
}
