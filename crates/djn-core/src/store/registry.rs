// ── Subscriber registry ──
//
// Maps subscriber ids to callbacks. `notify_all` works from a copy of the
// entries taken before any callback runs, so callbacks may subscribe or
// unsubscribe (themselves or others) without deadlocking. Each callback
// runs under `catch_unwind`; a panicking subscriber is logged and the
// rest still get the snapshot.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::{debug, warn};

use super::Snapshot;
use crate::model::Resource;

type Callback<T> = Arc<dyn Fn(&Snapshot<T>) + Send + Sync>;

struct Subscriber<T> {
    /// Distinguishes a re-registered id from the entry that was copied.
    token: u64,
    callback: Callback<T>,
}

/// Observers of one resource kind, keyed by subscriber id.
pub struct SubscriptionRegistry<T: Resource> {
    entries: DashMap<String, Subscriber<T>>,
    next_token: AtomicU64,
}

impl<T: Resource> SubscriptionRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_token: AtomicU64::new(0),
        }
    }

    /// Register `callback` under `id`. Returns `true` if an existing
    /// callback for the same id was replaced.
    pub fn subscribe<F>(&self, id: impl Into<String>, callback: F) -> bool
    where
        F: Fn(&Snapshot<T>) + Send + Sync + 'static,
    {
        let id = id.into();
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let replaced = self
            .entries
            .insert(
                id.clone(),
                Subscriber {
                    token,
                    callback: Arc::new(callback),
                },
            )
            .is_some();
        debug!(kind = T::KIND, subscriber = %id, replaced, "subscribed");
        replaced
    }

    /// Remove the callback registered under `id`. Returns `true` if one existed.
    pub fn unsubscribe(&self, id: &str) -> bool {
        let removed = self.entries.remove(id).is_some();
        debug!(kind = T::KIND, subscriber = %id, removed, "unsubscribed");
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invoke every registered callback with `snapshot`.
    ///
    /// Subscribers removed or replaced while the fan-out is under way are
    /// skipped; subscribers added during it wait for the next snapshot.
    /// Returns the number of callbacks that completed without panicking.
    pub fn notify_all(&self, snapshot: &Snapshot<T>) -> usize {
        let targets: Vec<(String, u64, Callback<T>)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.token, Arc::clone(&e.callback)))
            .collect();

        let mut delivered = 0;
        for (id, token, callback) in targets {
            if !self.is_current(&id, token) {
                continue;
            }
            match panic::catch_unwind(AssertUnwindSafe(|| callback(snapshot))) {
                Ok(()) => delivered += 1,
                Err(payload) => warn!(
                    kind = T::KIND,
                    subscriber = %id,
                    panic = panic_message(payload.as_ref()),
                    "subscriber panicked while handling a snapshot"
                ),
            }
        }
        delivered
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn is_current(&self, id: &str, token: u64) -> bool {
        self.entries.get(id).is_some_and(|e| e.token == token)
    }
}

impl<T: Resource> Default for SubscriptionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
