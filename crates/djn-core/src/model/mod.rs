// ── Domain model ──
//
// Canonical record types published by the providers. Every record kind
// implements `Resource`, which gives the generic provider machinery a
// stable identifier and a name for logs and error messages.

pub mod kernel;
pub mod migration;
pub mod node;
pub mod spec;

pub use kernel::{Kernel, KernelReplica, KernelStatus};
pub use migration::{MigrationRequest, MigrationResult, ReplicaInfo};
pub use node::{KubernetesNode, KubernetesPod};
pub use spec::{KernelProvisioner, KernelSpec};

/// A record kind served by a [`ResourceProvider`](crate::ResourceProvider).
pub trait Resource: Clone + Send + Sync + 'static {
    /// Singular kind name, e.g. `"kernel"`.
    const KIND: &'static str;
    /// Plural used in user-facing messages, e.g. `"kernels"`.
    const PLURAL: &'static str;

    /// Identifier that is unique within one snapshot.
    fn resource_id(&self) -> &str;
}

impl Resource for Kernel {
    const KIND: &'static str = "kernel";
    const PLURAL: &'static str = "kernels";

    fn resource_id(&self) -> &str {
        &self.kernel_id
    }
}

impl Resource for KubernetesNode {
    const KIND: &'static str = "node";
    const PLURAL: &'static str = "nodes";

    fn resource_id(&self) -> &str {
        &self.node_id
    }
}

impl Resource for KernelSpec {
    const KIND: &'static str = "kernel spec";
    const PLURAL: &'static str = "kernel specs";

    fn resource_id(&self) -> &str {
        &self.name
    }
}
