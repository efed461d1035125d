// ── Kubernetes node domain types ──

use serde::{Deserialize, Serialize};

/// A Kubernetes node hosting kernel replica pods.
///
/// Memory figures are in GB as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KubernetesNode {
    pub node_id: String,
    pub pods: Vec<KubernetesPod>,
    pub age_secs: u64,
    pub ip: String,
    pub capacity_cpu: f64,
    pub capacity_memory: f64,
    pub capacity_gpus: f64,
    pub capacity_vgpus: f64,
    pub allocated_cpu: f64,
    pub allocated_memory: f64,
    pub allocated_gpus: f64,
    pub allocated_vgpus: f64,
}

impl KubernetesNode {
    /// Fraction of CPU capacity currently allocated, in `0.0..=1.0` when
    /// the node reports a capacity.
    pub fn cpu_utilization(&self) -> Option<f64> {
        (self.capacity_cpu > 0.0).then(|| self.allocated_cpu / self.capacity_cpu)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubernetesPod {
    pub pod_name: String,
    pub pod_phase: String,
    pub pod_age_secs: u64,
    pub pod_ip: String,
}
