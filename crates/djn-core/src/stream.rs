// ── Reactive snapshot streams ──
//
// Async counterpart of the callback registry: a `watch`-backed handle
// fed by the same publish step that notifies subscribers.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Resource;
use crate::store::Snapshot;

/// A subscription to the published snapshots of one resource kind.
///
/// Provides both point-in-time access and change notification via
/// [`changed()`](Self::changed) or by converting into a `Stream`. Slow
/// consumers only ever see the newest snapshot.
pub struct SnapshotStream<T: Resource> {
    current: Snapshot<T>,
    receiver: watch::Receiver<Snapshot<T>>,
}

impl<T: Resource> SnapshotStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot<T>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation (or at the last `changed()`).
    pub fn current(&self) -> &Snapshot<T> {
        &self.current
    }

    /// Wait for the next published snapshot.
    /// Returns `None` once the provider has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot<T>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream`. The first item is the snapshot current at
    /// conversion time.
    pub fn into_stream(self) -> SnapshotWatchStream<T> {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct SnapshotWatchStream<T: Resource> {
    inner: WatchStream<Snapshot<T>>,
}

impl<T: Resource> Stream for SnapshotWatchStream<T> {
    type Item = Snapshot<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
