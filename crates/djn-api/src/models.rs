// Wire types for the Cluster Gateway and the dashboard backend.
//
// Gateway payloads follow the protobuf JSON mapping (camelCase fields).
// Backend payloads keep the backend's Go field names verbatim.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ── Cluster Gateway ─────────────────────────────────────────────────

/// Response of `GET /api/id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayId {
    pub id: String,
}

/// Response of `GET /api/kernels`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KernelList {
    #[serde(default)]
    pub kernels: Vec<DistributedJupyterKernel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributedJupyterKernel {
    pub kernel_id: String,
    #[serde(default)]
    pub num_replicas: i32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub aggregate_busy_status: String,
    #[serde(default)]
    pub replicas: Vec<JupyterKernelReplica>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JupyterKernelReplica {
    pub replica_id: i32,
    pub kernel_id: String,
    #[serde(default)]
    pub pod_id: String,
    #[serde(default)]
    pub node_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaInfo {
    pub kernel_id: String,
    pub replica_id: i32,
}

/// Body of `POST /api/migrate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRequest {
    pub target_replica: ReplicaInfo,
}

/// Response of `POST /api/migrate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResponse {
    #[serde(default)]
    pub pod_id: Option<String>,
    #[serde(default)]
    pub node_id: Option<String>,
}

// ── Dashboard backend ───────────────────────────────────────────────

/// Node snapshot as produced by the backend's Kubernetes handler.
///
/// Durations are Go `time.Duration` values, i.e. nanoseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KubernetesNode {
    #[serde(rename = "NodeId", alias = "Nodes")]
    pub node_id: String,
    #[serde(rename = "Pods", default)]
    pub pods: Option<Vec<KubernetesPod>>,
    #[serde(rename = "Age", default)]
    pub age_nanos: i64,
    #[serde(rename = "IP", default)]
    pub ip: String,
    #[serde(rename = "CapacityCPU", default)]
    pub capacity_cpu: f64,
    #[serde(rename = "CapacityMemory", default)]
    pub capacity_memory: f64,
    #[serde(rename = "CapacityGPUs", default)]
    pub capacity_gpus: f64,
    #[serde(rename = "CapacityVGPUs", default)]
    pub capacity_vgpus: f64,
    #[serde(rename = "AllocatedCPU", default)]
    pub allocated_cpu: f64,
    #[serde(rename = "AllocatedMemory", default)]
    pub allocated_memory: f64,
    #[serde(rename = "AllocatedGPUs", default)]
    pub allocated_gpus: f64,
    #[serde(rename = "AllocatedVGPUs", default)]
    pub allocated_vgpus: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KubernetesPod {
    #[serde(rename = "PodName")]
    pub pod_name: String,
    #[serde(rename = "PodPhase", default)]
    pub pod_phase: String,
    #[serde(rename = "PodAge", default)]
    pub pod_age_nanos: i64,
    #[serde(rename = "PodIP", default)]
    pub pod_ip: String,
}

/// Reply to `request-nodes`: node name -> node.
pub type NodeMap = HashMap<String, KubernetesNode>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelSpec {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub interrupt_mode: String,
    #[serde(default)]
    pub kernel_provisioner: Option<KernelProvisioner>,
    #[serde(default)]
    pub argv: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelProvisioner {
    pub name: String,
    #[serde(rename = "display_name", default)]
    pub gateway: String,
}

/// Error envelope the backend writes instead of a normal reply.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorMessage {
    #[serde(rename = "ErrorMessage")]
    pub error_message: String,
    #[serde(rename = "Valid", default)]
    pub valid: bool,
}
