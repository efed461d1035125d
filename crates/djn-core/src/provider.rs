// ── Resource provider façade ──
//
// Composes cache, registry, coordinator and poll loop for one resource
// kind. Kernels, nodes and kernel specs differ only in the fetcher
// plugged in at construction.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::connection::GatewayConnection;
use crate::error::CoreError;
use crate::fetch::Fetcher;
use crate::model::Resource;
use crate::poll::{PollLoop, PollState};
use crate::refresh::{RefreshCoordinator, RefreshOutcome};
use crate::sink::ErrorSink;
use crate::store::Snapshot;
use crate::stream::SnapshotStream;

/// Live, cached view of one resource kind.
///
/// Cheaply cloneable via `Arc<ProviderInner>`; clones share everything.
pub struct ResourceProvider<T: Resource> {
    inner: Arc<ProviderInner<T>>,
}

impl<T: Resource> Clone for ResourceProvider<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ProviderInner<T: Resource> {
    coordinator: Arc<RefreshCoordinator<T>>,
    connection: GatewayConnection,
    poll: PollLoop,
    interval: Duration,
}

impl<T: Resource> ResourceProvider<T> {
    /// Create a provider. Does NOT connect or poll -- call
    /// [`start()`](Self::start) for that.
    pub fn new(
        fetcher: Arc<dyn Fetcher<T>>,
        connection: GatewayConnection,
        error_sink: Arc<dyn ErrorSink>,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                coordinator: Arc::new(RefreshCoordinator::new(fetcher, error_sink)),
                connection,
                poll: PollLoop::new(),
                interval,
            }),
        }
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Singular name of the resource kind, e.g. `"kernel"`.
    pub fn kind(&self) -> &'static str {
        T::KIND
    }

    pub fn count(&self) -> usize {
        self.inner.coordinator.cache().count()
    }

    /// The current snapshot. It never changes once handed out.
    pub fn list(&self) -> Snapshot<T> {
        self.inner.coordinator.cache().list()
    }

    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.inner.coordinator.cache().get(id)
    }

    /// Wall-clock time of the last successful refresh.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.coordinator.last_refresh()
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Refresh now, bypassing interval suppression. Returns at once with
    /// [`Coalesced`](RefreshOutcome::Coalesced) if a refresh is running.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        let cancel = self.inner.poll.token();
        self.inner.coordinator.refresh(&cancel).await
    }

    /// [`refresh_now`](Self::refresh_now) on a background task, for callers
    /// that must not wait at all.
    pub fn spawn_refresh(&self) -> JoinHandle<RefreshOutcome> {
        let provider = self.clone();
        tokio::spawn(async move { provider.refresh_now().await })
    }

    // ── Observers ────────────────────────────────────────────────

    /// Register `callback` under `id`, replacing any previous callback for
    /// that id. Callbacks run on the refreshing task; keep them short or
    /// use [`stream()`](Self::stream) instead.
    pub fn subscribe<F>(&self, id: impl Into<String>, callback: F)
    where
        F: Fn(&Snapshot<T>) + Send + Sync + 'static,
    {
        self.inner.coordinator.registry().subscribe(id, callback);
    }

    pub fn unsubscribe(&self, id: &str) -> bool {
        self.inner.coordinator.registry().unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.coordinator.registry().len()
    }

    pub fn stream(&self) -> SnapshotStream<T> {
        self.inner.coordinator.stream()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Connect the shared gateway connection (a no-op if already
    /// connected to `address`).
    pub async fn connect(&self, address: &str) -> Result<(), CoreError> {
        self.inner.connection.connect(address).await
    }

    /// Connect, then launch the poll loop. The first poll tick performs
    /// an immediate refresh.
    pub async fn start(&self, address: &str) -> Result<(), CoreError> {
        self.connect(address).await?;
        debug!(kind = T::KIND, address, "starting provider");
        self.inner
            .poll
            .start(
                Arc::clone(&self.inner.coordinator),
                self.inner.connection.clone(),
                self.inner.interval,
            )
            .await
    }

    /// Stop polling and wait for the poll task. Refreshes requested after
    /// this return [`Stopped`](RefreshOutcome::Stopped) until the next
    /// [`start()`](Self::start).
    pub async fn stop(&self) {
        self.inner.poll.stop().await;
        debug!(kind = T::KIND, "provider stopped");
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connection.is_connected()
    }

    pub fn is_polling(&self) -> bool {
        self.inner.poll.is_running()
    }

    pub fn poll_state(&self) -> watch::Receiver<PollState> {
        self.inner.poll.state()
    }
}
