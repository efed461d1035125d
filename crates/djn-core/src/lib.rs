//! Live resource providers for the distributed-kernel cluster dashboard.
//!
//! This crate sits between `djn-api` and the embedding application (the
//! `djn` CLI, or any UI):
//!
//! - **[`ResourceProvider<T>`]** -- one per resource kind (kernels, nodes,
//!   kernel specs). Composes a [`SnapshotCache`], a [`SubscriptionRegistry`],
//!   a [`RefreshCoordinator`] and a background poll loop over a shared
//!   [`GatewayConnection`].
//!
//! - **[`RefreshCoordinator`]** -- single-flight refresh: concurrent callers
//!   collapse into one fetch, failures keep the previous snapshot, and the
//!   poll loop skips ticks that arrive too soon after a successful refresh.
//!
//! - **[`Fetcher`]** -- the per-kind fetch step. Gateway/backend adapters
//!   live in [`fetch::gateway`], synthetic generators in [`fetch::spoof`].
//!
//! - **[`ClusterDashboard`]** -- wires the three providers to one connection
//!   according to a [`DashboardConfig`] and exposes replica migration.

pub mod config;
pub mod connection;
pub mod convert;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod model;
pub mod poll;
pub mod provider;
pub mod refresh;
pub mod sink;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::DashboardConfig;
pub use connection::{ConnectionState, GatewayConnection};
pub use dashboard::ClusterDashboard;
pub use error::CoreError;
pub use fetch::{FetchError, Fetcher, fetch_fn};
pub use poll::PollState;
pub use provider::ResourceProvider;
pub use refresh::{RefreshCoordinator, RefreshOutcome};
pub use sink::{ChannelErrorSink, ErrorReport, ErrorSink, LogErrorSink};
pub use store::{Snapshot, SnapshotCache, SubscriptionRegistry};
pub use stream::SnapshotStream;

pub use model::{
    Kernel, KernelProvisioner, KernelReplica, KernelSpec, KernelStatus, KubernetesNode,
    KubernetesPod, MigrationRequest, MigrationResult, ReplicaInfo, Resource,
};
