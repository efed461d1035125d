// ── Spoofed fetch adapters ──
//
// Synthetic stand-ins for the gateway and backend, used when the
// dashboard runs without a live cluster. The kernel generator is
// stateful: each fetch churns its population a little so observers see
// kernels come and go.

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::BoxFuture;
use rand::Rng;
use rand::seq::SliceRandom;
use strum::VariantArray;
use tracing::{debug, info};
use uuid::Uuid;

use super::{FetchError, Fetcher};
use crate::model::{
    Kernel, KernelProvisioner, KernelReplica, KernelSpec, KernelStatus, KubernetesNode,
    KubernetesPod,
};

const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(1500);
const SPOOFED_NODE_COUNT: usize = 3;

// ── Kernels ────────────────────────────────────────────────────────

/// Generates a churning population of fake distributed kernels.
pub struct SpoofedKernels {
    population: Mutex<Option<Vec<Kernel>>>,
    initial: RangeInclusive<usize>,
    max_delay: Duration,
}

impl SpoofedKernels {
    pub fn new() -> Self {
        Self {
            population: Mutex::new(None),
            initial: 2..=7,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// Seed exactly `count` kernels on the first fetch.
    pub fn with_initial_count(mut self, count: usize) -> Self {
        self.initial = count..=count;
        self
    }

    /// Upper bound of the simulated latency. Zero disables it.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Seed or churn the population and return a copy of it.
    fn advance(&self) -> Vec<Kernel> {
        let mut rng = rand::thread_rng();
        let mut population = self
            .population
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let needs_seed = population.as_ref().is_none_or(Vec::is_empty);
        if needs_seed {
            let count = rng.gen_range(self.initial.clone());
            info!(count, "created an initial batch of spoofed kernels");
            *population = Some((0..count).map(|_| spoof_kernel(&mut rng)).collect());
        } else if let Some(kernels) = population.as_mut() {
            churn(kernels, &mut rng);
        }

        population.clone().unwrap_or_default()
    }
}

impl Default for SpoofedKernels {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher<Kernel> for SpoofedKernels {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<Kernel>, FetchError>> {
        Box::pin(async move {
            let kernels = self.advance();
            simulate_latency(self.max_delay).await;
            Ok(kernels)
        })
    }
}

/// Remove up to half of the population and add up to a quarter of it
/// (up to five when two or fewer remain). Victims are drawn with
/// replacement, so a repeat pick removes nothing extra.
fn churn(kernels: &mut Vec<Kernel>, rng: &mut impl Rng) {
    let current = kernels.len();
    let max_add = if current <= 2 { 5 } else { current.div_ceil(4) };
    let max_delete = current.div_ceil(2);
    let num_to_delete = rng.gen_range(0..(max_delete + 1).max(2));
    let num_to_add = rng.gen_range(0..(max_add + 1).max(2));

    let victims: HashSet<String> = (0..num_to_delete)
        .filter_map(|_| kernels.choose(rng).map(|k| k.kernel_id.clone()))
        .collect();
    kernels.retain(|k| !victims.contains(&k.kernel_id));
    kernels.extend((0..num_to_add).map(|_| spoof_kernel(rng)));

    debug!(
        added = num_to_add,
        removed = victims.len(),
        total = kernels.len(),
        "churned spoofed kernels"
    );
}

fn spoof_kernel(rng: &mut impl Rng) -> Kernel {
    let status = KernelStatus::VARIANTS
        .choose(rng)
        .copied()
        .unwrap_or_default();
    let num_replicas: i32 = rng.gen_range(2..=4);
    let kernel_id = Uuid::new_v4().to_string();

    let replicas = (0..num_replicas)
        .map(|replica_id| KernelReplica {
            replica_id,
            kernel_id: kernel_id.clone(),
            pod_id: format!("kernel-{kernel_id}-{}", short_suffix()),
            node_id: format!("Node-{}", rng.gen_range(1..=3)),
        })
        .collect();

    Kernel {
        kernel_id,
        num_replicas,
        status,
        aggregate_busy_status: status,
        replicas,
    }
}

/// Five hex characters, like the random tail of a pod name.
fn short_suffix() -> String {
    Uuid::new_v4().simple().to_string().chars().take(5).collect()
}

async fn simulate_latency(max_delay: Duration) {
    if max_delay.is_zero() {
        return;
    }
    let delay = rand::thread_rng().gen_range(Duration::ZERO..max_delay);
    debug!(?delay, "simulating gateway latency");
    tokio::time::sleep(delay).await;
}

// ── Nodes ──────────────────────────────────────────────────────────

/// Generates `Node-1..=Node-3` with random allocations.
pub struct SpoofedNodes {
    max_delay: Duration,
}

impl SpoofedNodes {
    pub fn new() -> Self {
        Self {
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    fn generate() -> Vec<KubernetesNode> {
        let mut rng = rand::thread_rng();
        (1..=SPOOFED_NODE_COUNT)
            .map(|i| {
                let pods = (0..rng.gen_range(0..=3))
                    .map(|_| KubernetesPod {
                        pod_name: format!("kernel-{}-{}", Uuid::new_v4(), short_suffix()),
                        pod_phase: "Running".into(),
                        pod_age_secs: rng.gen_range(60..86_400),
                        pod_ip: format!("10.1.{i}.{}", rng.gen_range(2..250)),
                    })
                    .collect();

                KubernetesNode {
                    node_id: format!("Node-{i}"),
                    pods,
                    age_secs: rng.gen_range(3_600..2_592_000),
                    ip: format!("10.0.0.{i}"),
                    capacity_cpu: 64.0,
                    capacity_memory: 256.0,
                    capacity_gpus: 8.0,
                    capacity_vgpus: 72.0,
                    allocated_cpu: f64::from(rng.gen_range(0..=64_u32)),
                    allocated_memory: f64::from(rng.gen_range(0..=256_u32)),
                    allocated_gpus: f64::from(rng.gen_range(0..=8_u32)),
                    allocated_vgpus: f64::from(rng.gen_range(0..=72_u32)),
                }
            })
            .collect()
    }
}

impl Default for SpoofedNodes {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher<KubernetesNode> for SpoofedNodes {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<KubernetesNode>, FetchError>> {
        Box::pin(async move {
            let nodes = Self::generate();
            simulate_latency(self.max_delay).await;
            Ok(nodes)
        })
    }
}

// ── Kernel specs ───────────────────────────────────────────────────

/// Serves a fixed set of three kernel specs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpoofedKernelSpecs;

impl SpoofedKernelSpecs {
    pub fn specs() -> Vec<KernelSpec> {
        vec![
            KernelSpec {
                name: "distributed".into(),
                display_name: "Distributed Python3".into(),
                language: "python3".into(),
                interrupt_mode: "signal".into(),
                kernel_provisioner: Some(KernelProvisioner {
                    name: "gateway-provisioner".into(),
                    gateway: "gateway:8080".into(),
                }),
                argv: [
                    "/opt/conda/bin/python3",
                    "-m",
                    "distributed_notebook.kernel",
                    "-f",
                    "{connection_file}",
                    "--debug",
                    "--IPKernelApp.outstream_class=distributed_notebook.kernel.iostream.OutStream",
                ]
                .into_iter()
                .map(String::from)
                .collect(),
            },
            KernelSpec {
                name: "python3".into(),
                display_name: "Python 3 (ipykernel)".into(),
                language: "python".into(),
                interrupt_mode: "signal".into(),
                kernel_provisioner: None,
                argv: vec!["N/A".into()],
            },
            KernelSpec {
                name: "ai-kernel".into(),
                display_name: "AI-Powered Kernel".into(),
                language: "all of them".into(),
                interrupt_mode: "impossible".into(),
                kernel_provisioner: None,
                argv: vec!["N/A".into()],
            },
        ]
    }
}

impl Fetcher<KernelSpec> for SpoofedKernelSpecs {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<KernelSpec>, FetchError>> {
        Box::pin(async move { Ok(Self::specs()) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_fetch_seeds_within_bounds() {
        let fetcher = SpoofedKernels::new().with_max_delay(Duration::ZERO);
        let kernels = fetcher.fetch().await.unwrap();

        assert!((2..=7).contains(&kernels.len()), "got {}", kernels.len());
        for kernel in &kernels {
            assert!((2..=4).contains(&kernel.num_replicas));
            assert_eq!(kernel.replicas.len(), usize::try_from(kernel.num_replicas).unwrap());
            assert_eq!(kernel.status, kernel.aggregate_busy_status);
            for (idx, replica) in kernel.replicas.iter().enumerate() {
                assert_eq!(usize::try_from(replica.replica_id).unwrap(), idx);
                assert_eq!(replica.kernel_id, kernel.kernel_id);
                let prefix = format!("kernel-{}-", kernel.kernel_id);
                assert!(replica.pod_id.starts_with(&prefix));
                assert_eq!(replica.pod_id.len(), prefix.len() + 5);
                assert!(["Node-1", "Node-2", "Node-3"].contains(&replica.node_id.as_str()));
            }
        }
    }

    #[tokio::test]
    async fn fixed_initial_count_is_honored() {
        let fetcher = SpoofedKernels::new()
            .with_initial_count(3)
            .with_max_delay(Duration::ZERO);
        assert_eq!(fetcher.fetch().await.unwrap().len(), 3);
    }

    #[test]
    fn churn_stays_within_bounds() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let mut kernels: Vec<Kernel> = (0..8).map(|_| spoof_kernel(&mut rng)).collect();
            let before: HashSet<String> = kernels.iter().map(|k| k.kernel_id.clone()).collect();

            churn(&mut kernels, &mut rng);

            let survivors = kernels.iter().filter(|k| before.contains(&k.kernel_id)).count();
            let added = kernels.len() - survivors;
            // At most ceil(8 / 2) removed, at most ceil(8 / 4) added.
            assert!(survivors >= 4, "removed too many: {survivors} left");
            assert!(added <= 2, "added too many: {added}");
        }
    }

    #[test]
    fn small_population_can_grow_by_five() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let mut kernels: Vec<Kernel> = (0..2).map(|_| spoof_kernel(&mut rng)).collect();
            churn(&mut kernels, &mut rng);
            assert!(kernels.len() <= 2 + 5);
        }
    }

    #[tokio::test]
    async fn kernel_ids_are_unique() {
        let fetcher = SpoofedKernels::new().with_max_delay(Duration::ZERO);
        for _ in 0..20 {
            let kernels = fetcher.fetch().await.unwrap();
            let ids: HashSet<&str> = kernels.iter().map(|k| k.kernel_id.as_str()).collect();
            assert_eq!(ids.len(), kernels.len());
        }
    }

    #[tokio::test]
    async fn spoofed_nodes_are_bounded_by_capacity() {
        let nodes = SpoofedNodes::new()
            .with_max_delay(Duration::ZERO)
            .fetch()
            .await
            .unwrap();
        let ids: Vec<&str> = nodes.iter().map(|n| n.node_id.as_str()).collect();
        assert_eq!(ids, ["Node-1", "Node-2", "Node-3"]);
        assert!(nodes.iter().all(|n| n.allocated_cpu <= n.capacity_cpu));
    }

    #[tokio::test]
    async fn spoofed_specs_are_fixed() {
        let specs = SpoofedKernelSpecs.fetch().await.unwrap();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["distributed", "python3", "ai-kernel"]);
        assert_eq!(
            specs[0].kernel_provisioner.as_ref().unwrap().gateway,
            "gateway:8080"
        );
    }
}
