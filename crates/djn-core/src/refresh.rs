// ── Single-flight refresh ──
//
// Every refresh of a provider, timer-driven or manual, goes through
// `RefreshCoordinator::refresh`. The in-flight flag is a try-lock: a
// caller that finds a refresh already running returns `Coalesced` at once
// instead of waiting for it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::fetch::Fetcher;
use crate::model::Resource;
use crate::sink::ErrorSink;
use crate::store::{Snapshot, SnapshotCache, SubscriptionRegistry};
use crate::stream::SnapshotStream;

/// What a call to [`RefreshCoordinator::refresh`] did. None of these is an
/// error from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A fetch completed and `count` records were published.
    Refreshed { count: usize },
    /// Another refresh was already running; it serves this request.
    Coalesced,
    /// The fetch failed. The error went to the error sink and the previous
    /// snapshot is still published.
    Failed,
    /// Skipped because the last successful refresh was too recent.
    Suppressed { due_in: Duration },
    /// The provider has been stopped; nothing was published.
    Stopped,
}

impl RefreshOutcome {
    pub fn is_refreshed(&self) -> bool {
        matches!(self, Self::Refreshed { .. })
    }
}

/// Releases the in-flight flag when dropped, including when the refresh
/// future itself is dropped mid-fetch.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Fetches, caches and publishes snapshots of one resource kind.
pub struct RefreshCoordinator<T: Resource> {
    fetcher: Arc<dyn Fetcher<T>>,
    cache: SnapshotCache<T>,
    registry: SubscriptionRegistry<T>,
    snapshot_tx: watch::Sender<Snapshot<T>>,
    error_sink: Arc<dyn ErrorSink>,
    in_flight: AtomicBool,
    /// Monotonic time of the last successful refresh, for suppression.
    last_success: watch::Sender<Option<Instant>>,
    /// Wall-clock time of the last successful refresh, for display.
    last_refresh_at: watch::Sender<Option<DateTime<Utc>>>,
}

impl<T: Resource> RefreshCoordinator<T> {
    pub fn new(fetcher: Arc<dyn Fetcher<T>>, error_sink: Arc<dyn ErrorSink>) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(Vec::new()));
        let (last_success, _) = watch::channel(None);
        let (last_refresh_at, _) = watch::channel(None);
        Self {
            fetcher,
            cache: SnapshotCache::new(),
            registry: SubscriptionRegistry::new(),
            snapshot_tx,
            error_sink,
            in_flight: AtomicBool::new(false),
            last_success,
            last_refresh_at,
        }
    }

    /// Fetch and publish a fresh snapshot unless a refresh is already
    /// running.
    ///
    /// `cancel` is checked before the fetch and again once it returns.
    /// A fetch already under way is never interrupted, but its result is
    /// dropped once `cancel` has fired: the cache, the published snapshot
    /// and the refresh timestamps stay as they were.
    pub async fn refresh(&self, cancel: &CancellationToken) -> RefreshOutcome {
        let Some(_guard) = InFlightGuard::try_acquire(&self.in_flight) else {
            debug!(kind = T::KIND, "refresh already in flight; coalescing");
            return RefreshOutcome::Coalesced;
        };
        if cancel.is_cancelled() {
            return RefreshOutcome::Stopped;
        }

        let started = Instant::now();
        match self.fetcher.fetch().await {
            Ok(records) => {
                if cancel.is_cancelled() {
                    debug!(
                        kind = T::KIND,
                        fetched = records.len(),
                        "provider stopped during fetch; dropping result"
                    );
                    return RefreshOutcome::Stopped;
                }

                let snapshot = self.cache.replace_all(records);
                let count = snapshot.len();
                self.last_success.send_replace(Some(Instant::now()));
                self.last_refresh_at.send_replace(Some(Utc::now()));
                self.snapshot_tx.send_replace(Arc::clone(&snapshot));
                let delivered = self.registry.notify_all(&snapshot);
                debug!(
                    kind = T::KIND,
                    count,
                    delivered,
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "refresh complete"
                );
                RefreshOutcome::Refreshed { count }
            }
            Err(e) => {
                warn!(kind = T::KIND, error = %e, "refresh failed; keeping previous snapshot");
                let message = format!(
                    "Failed to fetch list of active {} from the Cluster Gateway.",
                    T::PLURAL
                );
                self.error_sink.handle_error(
                    &CoreError::Fetch {
                        kind: T::PLURAL,
                        source: e,
                    },
                    &message,
                );
                RefreshOutcome::Failed
            }
        }
    }

    /// [`refresh`](Self::refresh), unless the last successful refresh
    /// happened less than `interval` ago.
    pub async fn refresh_if_due(
        &self,
        interval: Duration,
        cancel: &CancellationToken,
    ) -> RefreshOutcome {
        let last = *self.last_success.borrow();
        if let Some(last) = last {
            let elapsed = last.elapsed();
            if elapsed < interval {
                return RefreshOutcome::Suppressed {
                    due_in: interval - elapsed,
                };
            }
        }
        self.refresh(cancel).await
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn cache(&self) -> &SnapshotCache<T> {
        &self.cache
    }

    pub fn registry(&self) -> &SubscriptionRegistry<T> {
        &self.registry
    }

    pub fn stream(&self) -> SnapshotStream<T> {
        SnapshotStream::new(self.snapshot_tx.subscribe())
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh_at.borrow()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use futures_util::future::BoxFuture;

    use super::*;
    use crate::fetch::FetchError;

    #[derive(Debug, Clone, PartialEq)]
    struct Rec(String);

    impl Resource for Rec {
        const KIND: &'static str = "record";
        const PLURAL: &'static str = "records";

        fn resource_id(&self) -> &str {
            &self.0
        }
    }

    /// Returns the next scripted result on each call, after `delay`.
    struct ScriptedFetcher {
        calls: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
        delay: Duration,
        script: Mutex<Vec<Result<Vec<&'static str>, &'static str>>>,
    }

    impl ScriptedFetcher {
        fn new(delay: Duration, script: Vec<Result<Vec<&'static str>, &'static str>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                delay,
                script: Mutex::new(script.into_iter().rev().collect()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetcher<Rec> for ScriptedFetcher {
        fn fetch(&self) -> BoxFuture<'_, Result<Vec<Rec>, FetchError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_active.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(self.delay).await;
                self.active.fetch_sub(1, Ordering::SeqCst);

                let next = self.script.lock().unwrap().pop().unwrap_or(Ok(vec![]));
                next.map(|ids| ids.into_iter().map(|id| Rec(id.into())).collect())
                    .map_err(FetchError::failed)
            })
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<(String, String)>>);

    impl ErrorSink for RecordingSink {
        fn handle_error(&self, error: &CoreError, message: &str) {
            let mut chain = error.to_string();
            if let Some(source) = std::error::Error::source(error) {
                chain = format!("{chain} ({source})");
            }
            self.0.lock().unwrap().push((chain, message.to_owned()));
        }
    }

    fn coordinator(
        fetcher: &Arc<ScriptedFetcher>,
        sink: &Arc<RecordingSink>,
    ) -> Arc<RefreshCoordinator<Rec>> {
        Arc::new(RefreshCoordinator::new(
            Arc::clone(fetcher) as Arc<dyn Fetcher<Rec>>,
            Arc::clone(sink) as Arc<dyn ErrorSink>,
        ))
    }

    fn ids(snapshot: &Snapshot<Rec>) -> Vec<String> {
        snapshot.iter().map(|r| r.0.clone()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_refreshes_collapse_into_one_fetch() {
        let fetcher = ScriptedFetcher::new(
            Duration::from_millis(500),
            vec![Ok(vec!["k1", "k2", "k3"])],
        );
        let sink = Arc::new(RecordingSink::default());
        let coord = coordinator(&fetcher, &sink);
        let cancel = CancellationToken::new();

        let (a, b) = tokio::join!(coord.refresh(&cancel), coord.refresh(&cancel));

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(fetcher.max_active.load(Ordering::SeqCst), 1);
        let mut outcomes = [a, b];
        outcomes.sort_by_key(|o| o.is_refreshed());
        assert_eq!(
            outcomes,
            [
                RefreshOutcome::Coalesced,
                RefreshOutcome::Refreshed { count: 3 }
            ]
        );
        assert_eq!(coord.cache().count(), 3);
        assert!(!coord.is_refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_refreshes_from_spawned_tasks_never_overlap() {
        let fetcher = ScriptedFetcher::new(Duration::from_millis(500), vec![]);
        let sink = Arc::new(RecordingSink::default());
        let coord = coordinator(&fetcher, &sink);
        let cancel = CancellationToken::new();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let coord = Arc::clone(&coord);
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move { coord.refresh(&cancel).await }));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(fetcher.max_active.load(Ordering::SeqCst), 1);
        assert!(fetcher.calls() >= 2);
    }

    #[tokio::test]
    async fn successful_refresh_replaces_snapshot_atomically() {
        let fetcher = ScriptedFetcher::new(
            Duration::ZERO,
            vec![Ok(vec!["a", "b"]), Ok(vec!["c"])],
        );
        let sink = Arc::new(RecordingSink::default());
        let coord = coordinator(&fetcher, &sink);
        let cancel = CancellationToken::new();

        coord.refresh(&cancel).await;
        assert_eq!(ids(&coord.cache().list()), ["a", "b"]);

        coord.refresh(&cancel).await;
        assert_eq!(ids(&coord.cache().list()), ["c"]);
        assert!(coord.last_refresh().is_some());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let fetcher = ScriptedFetcher::new(
            Duration::ZERO,
            vec![Ok(vec!["k1", "k2"]), Err("gateway unreachable")],
        );
        let sink = Arc::new(RecordingSink::default());
        let coord = coordinator(&fetcher, &sink);
        let cancel = CancellationToken::new();

        coord.refresh(&cancel).await;
        let before = coord.cache().list();
        let notified = Arc::new(AtomicUsize::new(0));
        let n = Arc::clone(&notified);
        coord.registry().subscribe("panel", move |_: &Snapshot<Rec>| {
            n.fetch_add(1, Ordering::SeqCst);
        });

        let outcome = coord.refresh(&cancel).await;

        assert_eq!(outcome, RefreshOutcome::Failed);
        assert!(Arc::ptr_eq(&before, &coord.cache().list()));
        assert_eq!(notified.load(Ordering::SeqCst), 0);

        let reports = sink.0.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].0.contains("gateway unreachable"));
        assert_eq!(
            reports[0].1,
            "Failed to fetch list of active records from the Cluster Gateway."
        );
    }

    #[tokio::test]
    async fn subscribers_and_stream_see_published_snapshot() {
        let fetcher = ScriptedFetcher::new(Duration::ZERO, vec![Ok(vec!["k1"])]);
        let sink = Arc::new(RecordingSink::default());
        let coord = coordinator(&fetcher, &sink);
        let mut stream = coord.stream();

        let seen = Arc::new(Mutex::new(Vec::new()));
        for id in ["a", "b", "c"] {
            let seen = Arc::clone(&seen);
            coord.registry().subscribe(id, move |snap: &Snapshot<Rec>| {
                seen.lock().unwrap().push(ids(snap));
            });
        }

        coord.refresh(&CancellationToken::new()).await;

        assert_eq!(seen.lock().unwrap().len(), 3);
        assert!(seen.lock().unwrap().iter().all(|s| s == &["k1"]));
        let published = stream.changed().await.unwrap();
        assert_eq!(ids(&published), ["k1"]);
    }

    #[tokio::test]
    async fn cancelled_token_prevents_fetch() {
        let fetcher = ScriptedFetcher::new(Duration::ZERO, vec![]);
        let sink = Arc::new(RecordingSink::default());
        let coord = coordinator(&fetcher, &sink);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(coord.refresh(&cancel).await, RefreshOutcome::Stopped);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_fetch_lets_fetch_finish_without_notifying() {
        let fetcher = ScriptedFetcher::new(Duration::from_secs(1), vec![Ok(vec!["k1"])]);
        let sink = Arc::new(RecordingSink::default());
        let coord = coordinator(&fetcher, &sink);
        let cancel = CancellationToken::new();

        let notified = Arc::new(AtomicUsize::new(0));
        let n = Arc::clone(&notified);
        coord.registry().subscribe("panel", move |_: &Snapshot<Rec>| {
            n.fetch_add(1, Ordering::SeqCst);
        });

        let task = {
            let coord = Arc::clone(&coord);
            let cancel = cancel.clone();
            tokio::spawn(async move { coord.refresh(&cancel).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        assert_eq!(task.await.unwrap(), RefreshOutcome::Stopped);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(notified.load(Ordering::SeqCst), 0);

        // Cache and published snapshot still agree, and the dropped result
        // does not hold back the next tick.
        assert!(coord.cache().is_empty());
        assert_eq!(ids(&coord.cache().list()), ids(coord.stream().current()));
        assert!(coord.last_refresh().is_none());
        let restarted = CancellationToken::new();
        assert!(
            !matches!(
                coord.refresh_if_due(Duration::from_secs(10), &restarted).await,
                RefreshOutcome::Suppressed { .. }
            )
        );
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_too_soon_after_success_are_suppressed() {
        let fetcher = ScriptedFetcher::new(Duration::ZERO, vec![]);
        let sink = Arc::new(RecordingSink::default());
        let coord = coordinator(&fetcher, &sink);
        let cancel = CancellationToken::new();
        let interval = Duration::from_secs(10);

        // Manual refresh at t=0.
        assert!(coord.refresh(&cancel).await.is_refreshed());

        tokio::time::advance(Duration::from_secs(4)).await;
        match coord.refresh_if_due(interval, &cancel).await {
            RefreshOutcome::Suppressed { due_in } => assert!(due_in <= Duration::from_secs(6)),
            other => panic!("expected Suppressed, got {other:?}"),
        }
        assert_eq!(fetcher.calls(), 1);

        tokio::time::advance(Duration::from_secs(7)).await;
        assert!(coord.refresh_if_due(interval, &cancel).await.is_refreshed());
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_does_not_suppress_next_tick() {
        let fetcher = ScriptedFetcher::new(Duration::ZERO, vec![Err("boom")]);
        let sink = Arc::new(RecordingSink::default());
        let coord = coordinator(&fetcher, &sink);
        let cancel = CancellationToken::new();

        assert_eq!(coord.refresh(&cancel).await, RefreshOutcome::Failed);
        assert!(
            coord
                .refresh_if_due(Duration::from_secs(10), &cancel)
                .await
                .is_refreshed()
        );
    }
}
