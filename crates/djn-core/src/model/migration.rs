// ── Replica migration ──

use serde::{Deserialize, Serialize};

/// Identifies one replica of one kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaInfo {
    pub kernel_id: String,
    pub replica_id: i32,
}

/// Request to move a replica to another node. The gateway picks the
/// destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRequest {
    pub target_replica: Option<ReplicaInfo>,
}

impl MigrationRequest {
    pub fn new(kernel_id: impl Into<String>, replica_id: i32) -> Self {
        Self {
            target_replica: Some(ReplicaInfo {
                kernel_id: kernel_id.into(),
                replica_id,
            }),
        }
    }
}

/// Where the migrated replica ended up, if the gateway said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationResult {
    pub kernel_id: String,
    pub replica_id: i32,
    pub pod_id: Option<String>,
    pub node_id: Option<String>,
}
