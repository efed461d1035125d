// ── Provider-side storage ──
//
// The last known-good snapshot of one resource kind, and the observers
// that want to hear about the next one.

mod cache;
mod registry;

use std::sync::Arc;

pub use cache::SnapshotCache;
pub use registry::SubscriptionRegistry;

/// An immutable, shareable snapshot of one resource kind.
///
/// Handing out `Arc`s means observers can keep a snapshot for as long as
/// they like without ever seeing it change underneath them.
pub type Snapshot<T> = Arc<Vec<Arc<T>>>;
