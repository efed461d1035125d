// ── Distributed kernel domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantArray};

/// Lifecycle status of a kernel (or the aggregate busy status of its
/// replicas). Unrecognized wire values map to [`Unknown`](Self::Unknown).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    VariantArray,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum KernelStatus {
    #[default]
    Unknown,
    Starting,
    Idle,
    Busy,
    Terminating,
    Restarting,
    AutoRestarting,
    Dead,
}

impl KernelStatus {
    /// Parse a status string as reported by the gateway.
    pub fn from_wire(raw: &str) -> Self {
        raw.trim().parse().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kernel {
    pub kernel_id: String,
    pub num_replicas: i32,
    pub status: KernelStatus,
    pub aggregate_busy_status: KernelStatus,
    pub replicas: Vec<KernelReplica>,
}

impl Kernel {
    /// Look up one replica by its id.
    pub fn replica(&self, replica_id: i32) -> Option<&KernelReplica> {
        self.replicas.iter().find(|r| r.replica_id == replica_id)
    }
}

/// One replica of a distributed kernel, running in its own pod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelReplica {
    pub replica_id: i32,
    pub kernel_id: String,
    pub pod_id: String,
    pub node_id: String,
}
