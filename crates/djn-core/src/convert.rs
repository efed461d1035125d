// ── API-to-domain type conversions ──
//
// Bridges raw `djn_api::models` wire types into canonical `djn_core::model`
// domain types. Status strings are parsed into `KernelStatus`, Go
// nanosecond durations become whole seconds, and missing optional data
// gets empty defaults.

use djn_api::models as wire;

use crate::model::{
    Kernel, KernelProvisioner, KernelReplica, KernelSpec, KernelStatus, KubernetesNode,
    KubernetesPod, MigrationResult, ReplicaInfo,
};

// ── Helpers ────────────────────────────────────────────────────────

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Go `time.Duration` nanoseconds to whole seconds. Negative ages clamp to 0.
fn nanos_to_secs(nanos: i64) -> u64 {
    u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(0)
}

// ── Kernels ────────────────────────────────────────────────────────

impl From<wire::DistributedJupyterKernel> for Kernel {
    fn from(k: wire::DistributedJupyterKernel) -> Self {
        Self {
            kernel_id: k.kernel_id,
            num_replicas: k.num_replicas,
            status: KernelStatus::from_wire(&k.status),
            aggregate_busy_status: KernelStatus::from_wire(&k.aggregate_busy_status),
            replicas: k.replicas.into_iter().map(KernelReplica::from).collect(),
        }
    }
}

impl From<wire::JupyterKernelReplica> for KernelReplica {
    fn from(r: wire::JupyterKernelReplica) -> Self {
        Self {
            replica_id: r.replica_id,
            kernel_id: r.kernel_id,
            pod_id: r.pod_id,
            node_id: r.node_id,
        }
    }
}

// ── Nodes ──────────────────────────────────────────────────────────

impl From<wire::KubernetesNode> for KubernetesNode {
    fn from(n: wire::KubernetesNode) -> Self {
        Self {
            node_id: n.node_id,
            pods: n
                .pods
                .unwrap_or_default()
                .into_iter()
                .map(KubernetesPod::from)
                .collect(),
            age_secs: nanos_to_secs(n.age_nanos),
            ip: n.ip,
            capacity_cpu: n.capacity_cpu,
            capacity_memory: n.capacity_memory,
            capacity_gpus: n.capacity_gpus,
            capacity_vgpus: n.capacity_vgpus,
            allocated_cpu: n.allocated_cpu,
            allocated_memory: n.allocated_memory,
            allocated_gpus: n.allocated_gpus,
            allocated_vgpus: n.allocated_vgpus,
        }
    }
}

impl From<wire::KubernetesPod> for KubernetesPod {
    fn from(p: wire::KubernetesPod) -> Self {
        Self {
            pod_name: p.pod_name,
            pod_phase: p.pod_phase,
            pod_age_secs: nanos_to_secs(p.pod_age_nanos),
            pod_ip: p.pod_ip,
        }
    }
}

/// Flatten the backend's node map into a list sorted by node id.
///
/// Entries with an empty `NodeId` take their map key as the id.
pub fn nodes_from_map(map: wire::NodeMap) -> Vec<KubernetesNode> {
    let mut nodes: Vec<KubernetesNode> = map
        .into_iter()
        .map(|(key, mut node)| {
            if node.node_id.is_empty() {
                node.node_id = key;
            }
            KubernetesNode::from(node)
        })
        .collect();
    nodes.sort_by(|a, b| a.node_id.cmp(&b.node_id));
    nodes
}

// ── Kernel specs ───────────────────────────────────────────────────

impl From<wire::KernelSpec> for KernelSpec {
    fn from(s: wire::KernelSpec) -> Self {
        Self {
            name: s.name,
            display_name: s.display_name,
            language: s.language,
            interrupt_mode: s.interrupt_mode,
            kernel_provisioner: s.kernel_provisioner.map(|p| KernelProvisioner {
                name: p.name,
                gateway: p.gateway,
            }),
            argv: s.argv,
        }
    }
}

// ── Migration ──────────────────────────────────────────────────────

impl From<ReplicaInfo> for wire::ReplicaInfo {
    fn from(r: ReplicaInfo) -> Self {
        Self {
            kernel_id: r.kernel_id,
            replica_id: r.replica_id,
        }
    }
}

pub(crate) fn migration_result(target: ReplicaInfo, resp: wire::MigrationResponse) -> MigrationResult {
    MigrationResult {
        kernel_id: target.kernel_id,
        replica_id: target.replica_id,
        pod_id: resp.pod_id.filter(|s| !s.is_empty()),
        node_id: resp.node_id.filter(|s| !s.is_empty()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn kernel_statuses_are_parsed() {
        let k = wire::DistributedJupyterKernel {
            kernel_id: "k-1".into(),
            num_replicas: 3,
            status: "busy".into(),
            aggregate_busy_status: "idle".into(),
            replicas: vec![wire::JupyterKernelReplica {
                replica_id: 1,
                kernel_id: "k-1".into(),
                pod_id: "kernel-k-1-abcde".into(),
                node_id: "node-a".into(),
            }],
        };

        let kernel = Kernel::from(k);
        assert_eq!(kernel.status, KernelStatus::Busy);
        assert_eq!(kernel.aggregate_busy_status, KernelStatus::Idle);
        assert_eq!(kernel.replica(1).unwrap().node_id, "node-a");
    }

    #[test]
    fn node_map_is_sorted_and_keyed() {
        let mut map = HashMap::new();
        map.insert(
            "node-b".to_owned(),
            wire::KubernetesNode {
                node_id: "node-b".into(),
                age_nanos: 90 * NANOS_PER_SEC,
                ..Default::default()
            },
        );
        map.insert("node-a".to_owned(), wire::KubernetesNode::default());

        let nodes = nodes_from_map(map);
        let ids: Vec<&str> = nodes.iter().map(|n| n.node_id.as_str()).collect();
        assert_eq!(ids, ["node-a", "node-b"]);
        assert_eq!(nodes[1].age_secs, 90);
        assert!(nodes[0].pods.is_empty());
    }

    #[test]
    fn negative_age_clamps_to_zero() {
        assert_eq!(nanos_to_secs(-5), 0);
    }
}
